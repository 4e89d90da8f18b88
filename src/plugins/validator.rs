use super::TransactionPlugin;
use crate::data::TransactionData;
use crate::error::TxError;

type Check = dyn Fn(&TransactionData) -> Result<(), TxError> + Send + Sync;

/// Runs a caller-supplied check before anything else happens.
pub struct ValidatorPlugin {
    name: String,
    check: Box<Check>,
}

impl ValidatorPlugin {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&TransactionData) -> Result<(), TxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }
}

impl std::fmt::Debug for ValidatorPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorPlugin")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TransactionPlugin for ValidatorPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn before_build(&self, data: &mut TransactionData) -> Result<(), TxError> {
        (self.check)(data)
    }
}
