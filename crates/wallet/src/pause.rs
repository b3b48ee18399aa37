//! Pause switch - global emergency brake

use crate::error::{WalletError, WalletResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseSwitch {
    paused: bool,
}

impl PauseSwitch {
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fail with `SystemPaused` while paused
    pub fn ensure_running(&self, operation: &'static str) -> WalletResult<()> {
        if self.paused {
            return Err(WalletError::SystemPaused { operation });
        }
        Ok(())
    }

    pub fn check_unpause(&self) -> WalletResult<()> {
        if !self.paused {
            return Err(WalletError::NotPaused);
        }
        Ok(())
    }

    pub fn set(&mut self, paused: bool) {
        self.paused = paused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_by_default() {
        let switch = PauseSwitch::default();
        assert!(!switch.is_paused());
        assert!(switch.ensure_running("submit_transaction").is_ok());
        assert!(matches!(switch.check_unpause(), Err(WalletError::NotPaused)));
    }

    #[test]
    fn test_paused_blocks() {
        let mut switch = PauseSwitch::default();
        switch.set(true);
        assert!(matches!(
            switch.ensure_running("execute_transaction"),
            Err(WalletError::SystemPaused {
                operation: "execute_transaction"
            })
        ));
        assert!(switch.check_unpause().is_ok());
    }
}
