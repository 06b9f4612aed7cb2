// src/types.rs

// Change notifications from the ingestion worker; the data itself is read from the store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepMessage {
    SpectrumUpdated,
    WaterfallUpdated,
}

// Why the application is going down
#[derive(Clone, Debug, PartialEq)]
pub enum ShutdownReason {
    /// Ctrl-C or the window was closed.
    Interrupted,
    /// The sweep tool reported the "no usable bins" record.
    Sentinel,
    /// The sweep tool closed its output.
    StreamEnded,
    Failed(String),
}

pub const EXIT_SENTINEL: u8 = 2;
pub const EXIT_FAILURE: u8 = 1;

impl ShutdownReason {
    pub fn exit_code(&self) -> u8 {
        match self {
            ShutdownReason::Interrupted | ShutdownReason::StreamEnded => 0,
            ShutdownReason::Sentinel => EXIT_SENTINEL,
            ShutdownReason::Failed(_) => EXIT_FAILURE,
        }
    }

    // Whether the GUI should close rather than keep showing the last sweep
    pub fn closes_window(&self) -> bool {
        !matches!(self, ShutdownReason::StreamEnded)
    }
}
