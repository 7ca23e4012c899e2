/// File-selection scope for a transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileSelection {
    /// Copy exactly the named entries, no directory recursion.
    Single,
    /// Walk directories and transfer their whole contents (`-r`).
    Recursive,
}

/// Options the Generator consults while walking the file list. A plain struct with public fields rather than a
/// builder: every field is required up front and the struct is never
/// mutated after construction.
#[derive(Clone, Copy, Debug)]
pub struct GeneratorOptions {
    pub preserve_user: bool,
    pub preserve_group: bool,
    pub preserve_links: bool,
    pub preserve_permissions: bool,
    pub preserve_times: bool,
    pub numeric_ids: bool,
    pub ignore_times: bool,
    pub always_itemize: bool,
    pub delete: bool,
    pub file_selection: FileSelection,
    pub verbosity: u8,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            preserve_user: false,
            preserve_group: false,
            preserve_links: true,
            preserve_permissions: false,
            preserve_times: true,
            numeric_ids: false,
            ignore_times: false,
            always_itemize: false,
            delete: false,
            file_selection: FileSelection::Recursive,
            verbosity: 0,
        }
    }
}

/// Options the Receiver applies while reconstructing files.
#[derive(Clone, Copy, Debug)]
pub struct ReceiverOptions {
    pub preserve_user: bool,
    pub preserve_group: bool,
    pub preserve_permissions: bool,
    pub preserve_times: bool,
    pub numeric_ids: bool,
    pub defer_write: bool,
    pub max_redo_attempts: u32,
}

impl Default for ReceiverOptions {
    fn default() -> Self {
        Self {
            preserve_user: false,
            preserve_group: false,
            preserve_permissions: false,
            preserve_times: true,
            numeric_ids: false,
            defer_write: false,
            max_redo_attempts: 2,
        }
    }
}

/// Options the Sender applies while reading source files and scanning them
/// against a receiver's checksum header.
#[derive(Clone, Copy, Debug)]
pub struct SenderOptions {
    pub preserve_links: bool,
    pub interruptible: bool,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            preserve_links: true,
            interruptible: true,
        }
    }
}
