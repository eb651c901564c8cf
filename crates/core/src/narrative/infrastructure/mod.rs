pub mod gemini_narrator;
pub mod unavailable_narrator;
