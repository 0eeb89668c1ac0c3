use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("empty instruction block")]
    EmptyBlock,

    /// An operand reached the allocator or scheduler without a virtual register.
    #[error("instruction {index}: operand has no virtual register (run next-use analysis first)")]
    Unannotated { index: usize },

    #[error("need at least 2 physical registers (r0 is reserved for spill addresses), got {k}")]
    TooFewRegisters { k: usize },

    #[error("instruction {index}: no physical register left to spill with k = {k}")]
    AllocationExhausted { index: usize, k: usize },

    #[error("instruction {index}: vr{vr} has no memory location or rematerialization record")]
    MissingSpillLocation { index: usize, vr: u32 },

    #[error("instruction {index}: read of undefined register r{reg}")]
    UndefinedRegister { index: usize, reg: u32 },
}

impl Error {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
