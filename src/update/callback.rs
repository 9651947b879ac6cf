use std::fmt;

use super::OutputArchive;
use crate::engine::{
    ArchiveUpdateCallback, CompressProgress, CryptoPassword, OperationResult, OutStream,
    ReadSeek, UpdateItemInfo,
};
use crate::password::Password;
use crate::property::{PropValue, PropertyId};
use crate::{Error, Result};

/// Lifecycle of an [`UpdateCallback`].
///
/// ```text
/// Bound --begin--> EngineDriving --finalize--> Finalized
///   \______________________finalize______________/
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    /// Created and tied to an output archive, not yet handed to the engine.
    Bound,
    /// The engine is inside its update call.
    EngineDriving,
    /// The engine returned. Every further request is rejected.
    Finalized,
}

impl CallbackState {
    fn name(self) -> &'static str {
        match self {
            Self::Bound => "bound",
            Self::EngineDriving => "driving",
            Self::Finalized => "finalized",
        }
    }
}

/// Answers the engine's requests for one update.
///
/// The callback borrows the output archive exclusively for its whole life.
/// Requests are only honoured between [`begin`](Self::begin) and
/// [`finalize`](Self::finalize); anything else is a
/// [`Error::ProtocolViolation`].
pub struct UpdateCallback<'a, 'c> {
    output: &'a mut OutputArchive<'c>,
    state: CallbackState,
    /// Output index of the last item whose stream was handed out.
    current: Option<u32>,
    /// Output item count, fixed while the callback holds the archive.
    count: u32,
    total: u64,
}

impl<'a, 'c> UpdateCallback<'a, 'c> {
    /// Binds a callback to `output`.
    pub fn new(output: &'a mut OutputArchive<'c>) -> Self {
        let count = output.items_count();
        Self {
            output,
            state: CallbackState::Bound,
            current: None,
            count,
            total: 0,
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> CallbackState {
        self.state
    }

    /// Marks the start of the engine's update call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolViolation`] unless the callback is `Bound`.
    pub fn begin(&mut self) -> Result<()> {
        if self.state != CallbackState::Bound {
            return Err(self.violation("begin"));
        }
        self.state = CallbackState::EngineDriving;
        Ok(())
    }

    /// Ends the callback's life. Safe to call more than once.
    pub fn finalize(&mut self) {
        if self.state == CallbackState::Finalized {
            return;
        }
        if !self.output.failed_items().is_empty() {
            log::debug!(
                "update finished with {} failed items",
                self.output.failed_items().len()
            );
        }
        self.state = CallbackState::Finalized;
        self.current = None;
    }

    fn violation(&self, operation: &'static str) -> Error {
        Error::ProtocolViolation {
            operation,
            state: self.state.name(),
        }
    }

    fn ensure_driving(&self, operation: &'static str) -> Result<()> {
        if self.state == CallbackState::EngineDriving {
            Ok(())
        } else {
            Err(self.violation(operation))
        }
    }

    /// Number of output items the engine may address.
    pub fn items_count(&self) -> u32 {
        self.count
    }

    fn ensure_index(&self, index: u32) -> Result<()> {
        if index >= self.count {
            return Err(Error::invalid_argument(format!(
                "output index {} out of range (count {})",
                index, self.count
            )));
        }
        Ok(())
    }
}

impl ArchiveUpdateCallback for UpdateCallback<'_, '_> {
    fn get_update_item_info(&mut self, index: u32) -> Result<UpdateItemInfo> {
        self.ensure_driving("get_update_item_info")?;
        self.ensure_index(index)?;
        Ok(UpdateItemInfo {
            new_data: self.output.has_new_data(index),
            new_properties: self.output.has_new_properties(index),
            index_in_archive: self.output.index_in_archive(index),
        })
    }

    fn get_property(&mut self, index: u32, prop: PropertyId) -> Result<PropValue> {
        self.ensure_driving("get_property")?;
        self.ensure_index(index)?;
        Ok(self.output.output_item_property(index, prop))
    }

    fn get_stream(&mut self, index: u32) -> Result<Option<Box<dyn ReadSeek>>> {
        self.ensure_driving("get_stream")?;
        self.ensure_index(index)?;
        self.current = Some(index);
        self.output.output_item_stream(index)
    }

    fn get_volume_size(&mut self, _index: u32) -> Result<Option<u64>> {
        self.ensure_driving("get_volume_size")?;
        Ok(None)
    }

    fn get_volume_stream(&mut self, _index: u32) -> Result<Box<dyn OutStream>> {
        self.ensure_driving("get_volume_stream")?;
        Err(Error::UnsupportedOperation("engine-driven volume streams"))
    }

    fn set_operation_result(&mut self, result: OperationResult) -> Result<()> {
        self.ensure_driving("set_operation_result")?;
        let current = self.current.take();
        if !result.is_ok() {
            self.output.record_operation_failure(current, result);
        }
        Ok(())
    }
}

impl CompressProgress for UpdateCallback<'_, '_> {
    fn set_total(&mut self, total: u64) -> Result<()> {
        self.ensure_driving("set_total")?;
        self.total = total;
        self.output.progress_mut().on_total(total);
        Ok(())
    }

    fn set_completed(&mut self, completed: u64) -> Result<()> {
        self.ensure_driving("set_completed")?;
        let total = self.total;
        self.output.progress_mut().on_progress(completed, total);
        Ok(())
    }

    fn set_ratio_info(&mut self, in_size: u64, out_size: u64) -> Result<()> {
        self.ensure_driving("set_ratio_info")?;
        self.output.progress_mut().on_ratio(in_size, out_size);
        Ok(())
    }
}

impl CryptoPassword for UpdateCallback<'_, '_> {
    fn crypto_get_text_password2(&mut self) -> Result<Option<Password>> {
        self.ensure_driving("crypto_get_text_password2")?;
        if let Some(password) = self.output.creator().configured_password() {
            return Ok(Some(password.clone()));
        }
        Ok(self.output.progress_mut().on_password_needed())
    }
}

impl Drop for UpdateCallback<'_, '_> {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl fmt::Debug for UpdateCallback<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateCallback")
            .field("state", &self.state)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
