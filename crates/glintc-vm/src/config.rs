//! Knobs the driver's configuration layer can override per SPEC_FULL.md §12.

#[derive(Clone, Debug)]
pub struct VmConfig {
    /// Maximum live stack depth before `VmError::StackOverflow`.
    pub stack_size: usize,
    /// Internal argv index the user-visible argv[0] maps to (2 normally, 3
    /// when the script path itself should also appear in argv).
    pub argv_offset: i64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_size: 256,
            argv_offset: 2,
        }
    }
}
