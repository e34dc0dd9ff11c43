use thiserror::Error;

/// What the screen shows. Only one state exists at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    /// Initial screen, pre-filled with the last searched city.
    Welcome { last_city: Option<String> },
    Loading { message: String },
    Error { message: String },
    WeatherDisplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiStateKind {
    Welcome,
    Loading,
    Error,
    WeatherDisplay,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: UiStateKind, to: UiStateKind },
}

impl UiState {
    pub fn welcome(last_city: Option<String>) -> Self {
        UiState::Welcome { last_city }
    }

    pub fn kind(&self) -> UiStateKind {
        match self {
            UiState::Welcome { .. } => UiStateKind::Welcome,
            UiState::Loading { .. } => UiStateKind::Loading,
            UiState::Error { .. } => UiStateKind::Error,
            UiState::WeatherDisplay => UiStateKind::WeatherDisplay,
        }
    }

    /// Any state may start loading.
    pub fn begin_loading(&mut self, message: impl Into<String>) {
        *self = UiState::Loading {
            message: message.into(),
        };
    }

    /// Only a pending load can succeed.
    pub fn show_weather(&mut self) -> Result<(), StateError> {
        self.expect_loading(UiStateKind::WeatherDisplay)?;
        *self = UiState::WeatherDisplay;
        Ok(())
    }

    /// Errors may be raised from anywhere; input validation fails before loading starts.
    pub fn show_error(&mut self, message: impl Into<String>) {
        *self = UiState::Error {
            message: message.into(),
        };
    }

    fn expect_loading(&self, to: UiStateKind) -> Result<(), StateError> {
        match self.kind() {
            UiStateKind::Loading => Ok(()),
            from => Err(StateError::InvalidTransition { from, to }),
        }
    }
}
