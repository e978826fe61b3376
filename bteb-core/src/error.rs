use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BtebError {
    #[snafu(display("Pdfium `{}` error: {}", stage, source))]
    Pdfium {
        source: pdfium_render::prelude::PdfiumError,
        stage: String,
    },
    #[snafu(display("Read `{}` error: {}", path, source))]
    IoRead {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Write `{}` error: {}", path, source))]
    IoWrite {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Serialize results for `{}` error: {}", path, source))]
    Json {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Pdfium is not loaded, cannot read `{}`", path))]
    PdfiumUnavailable { path: String },
    #[snafu(display("Unsupported input `{}`, expected a .pdf or .txt file", path))]
    UnsupportedInput { path: String },
    #[snafu(display("Semester input for `{}` error: {}", path, message))]
    SemesterInput { path: String, message: String },
}
