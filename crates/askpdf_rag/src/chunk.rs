use askpdf_core::error::AppError;

/// Splits extracted page text into overlapping fixed-size windows suitable
/// for embedding. Windows are measured in characters and never cut through
/// a UTF-8 scalar; each window overlaps the previous by `overlap`
/// characters, so consecutive chunks share context across the boundary.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    size: usize,
    overlap: usize,
}

impl TextSplitter {
    /// `overlap >= size` would never advance through the text, so it is a
    /// configuration error, as is a zero window.
    pub fn new(size: usize, overlap: usize) -> Result<Self, AppError> {
        if size == 0 {
            return Err(AppError::new("CONFIG_INVALID", "Chunk size must be positive"));
        }
        if overlap >= size {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "Chunk overlap must be smaller than chunk size",
            )
            .with_details(format!("size={size}; overlap={overlap}")));
        }
        Ok(Self { size, overlap })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let chars: Vec<char> = text.chars().collect();
        let step = self.size - self.overlap;
        let mut out = Vec::new();
        let mut start = 0usize;
        loop {
            let end = (start + self.size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        out
    }
}
