pub mod narrative_generator;
