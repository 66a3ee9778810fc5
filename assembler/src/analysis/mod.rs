/// These modules provide functions that analyze placed forms
/// between address assignment and resolution.

/// Creates a structure to store the locations of labels.
/// Used for later computing addresses and branch distances from label operands.
pub mod symbol_table;
