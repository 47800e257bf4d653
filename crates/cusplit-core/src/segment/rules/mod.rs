//! Rule-based field extractors for CU recipient data.

pub mod name;
pub mod patterns;
pub mod tax_code;

use serde::Serialize;

pub use name::{NameExtractor, NameStrategy, PersonName, extract_name};
pub use tax_code::{TaxCodeExtractor, TaxCodeStrategy, extract_tax_code, validate_tax_code};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Name of the strategy that produced the value.
    pub strategy: &'static str,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, strategy: &'static str) -> Self {
        Self {
            value,
            confidence,
            position: None,
            strategy,
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Strategy and confidence, without the value.
    pub fn source(&self) -> FieldSource {
        FieldSource {
            strategy: self.strategy,
            confidence: self.confidence,
        }
    }
}

/// Which strategy found a field, and how sure it was.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSource {
    pub strategy: &'static str,
    pub confidence: f32,
}
