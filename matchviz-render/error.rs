#[derive(Debug, Clone)]
pub enum RenderError {
    InvalidCanvasSize { width: u32, height: u32 },
    CanvasAllocation { width: u32, height: u32 },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::InvalidCanvasSize { width, height } => {
                write!(f, "Invalid canvas dimensions: {}x{} (must be > 0 and addressable)", width, height)
            }
            RenderError::CanvasAllocation { width, height } => {
                write!(f, "Failed to allocate {}x{} canvas buffer", width, height)
            }
        }
    }
}

impl std::error::Error for RenderError {}

pub type RenderResult<T> = Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_dimensions() {
        let e = RenderError::InvalidCanvasSize { width: 0, height: 64 };
        assert!(e.to_string().contains("0x64"));

        let e = RenderError::CanvasAllocation { width: 128, height: 64 };
        assert!(e.to_string().contains("128x64"));
    }
}
