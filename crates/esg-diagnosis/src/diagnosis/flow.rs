use serde::{Deserialize, Serialize};

/// The three screens a session cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Landing,
    Diagnosis,
    Report,
}

impl Screen {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Diagnosis => "diagnosis",
            Self::Report => "report",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("cannot {action} from the {from} screen")]
pub struct FlowError {
    pub action: &'static str,
    pub from: &'static str,
}

/// Screen state machine: landing -> diagnosis -> report, cyclic by design.
///
/// There is no terminal state; every exit path returns to landing or
/// diagnosis.
#[derive(Debug, Clone, Copy)]
pub struct FlowController {
    screen: Screen,
}

impl Default for FlowController {
    fn default() -> Self {
        Self {
            screen: Screen::Landing,
        }
    }
}

impl FlowController {
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// landing -> diagnosis. The caller consumes a usage-limiter slot
    /// before invoking this.
    pub fn start(&mut self) -> Result<(), FlowError> {
        match self.screen {
            Screen::Landing => {
                self.screen = Screen::Diagnosis;
                Ok(())
            }
            other => Err(FlowError {
                action: "start a diagnosis",
                from: other.label(),
            }),
        }
    }

    /// diagnosis -> report, once a result exists.
    pub fn complete(&mut self) -> Result<(), FlowError> {
        match self.screen {
            Screen::Diagnosis => {
                self.screen = Screen::Report;
                Ok(())
            }
            other => Err(FlowError {
                action: "complete a diagnosis",
                from: other.label(),
            }),
        }
    }

    /// report -> diagnosis.
    pub fn back(&mut self) -> Result<(), FlowError> {
        match self.screen {
            Screen::Report => {
                self.screen = Screen::Diagnosis;
                Ok(())
            }
            other => Err(FlowError {
                action: "go back to the diagnosis",
                from: other.label(),
            }),
        }
    }

    /// Any screen -> landing.
    pub fn go_home(&mut self) {
        self.screen = Screen::Landing;
    }

    /// Direct navigation with the report guard: the report screen is
    /// unreachable without a current result and redirects to diagnosis.
    pub fn navigate(&mut self, target: Screen, has_result: bool) -> Screen {
        self.screen = match target {
            Screen::Report if !has_result => Screen::Diagnosis,
            other => other,
        };
        self.screen
    }
}
