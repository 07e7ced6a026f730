//! Route modules for the OCR relay server

pub mod health;
pub mod ocr;
