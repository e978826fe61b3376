/// Environment variable naming the directory that holds the PDFium shared library.
///
/// When unset the system library search path is used instead.
pub const PDFIUM_LIB_PATH_ENV_NAME: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Literal marker that identifies a result-sheet page carrying the institute header.
pub const BOARD_MARKER: &str = "Bangladesh Technical Education Board";

/// Number of leading page lines searched for the result date in header mode.
pub const DEFAULT_HEADER_LINES: usize = 10;

/// A document with no resolved semester and more semester-less records than this
/// needs the caller to supply one.
pub const SEMESTER_PROMPT_THRESHOLD: usize = 50;

/// Name of the directory created inside a batch input directory for the JSON output.
pub const OUTPUT_DIR_NAME: &str = "output";

/// Extension of the emitted result files.
pub const OUTPUT_EXTENSION: &str = "json";

/// Page separator used by `.txt` dumps of extracted PDF text.
pub const PAGE_BREAK: char = '\u{c}';
