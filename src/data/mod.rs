/// Data layer: synthetic classification data, subject frames, loading.
///
/// Architecture:
/// ```text
///  MoonsParams            .csv / .json / .parquet
///       │                         │
///       ▼                         ▼
///  ┌────────────┐           ┌──────────┐
///  │ make_moons │           │  loader  │  parse file → SubjectFrame
///  └────────────┘           └──────────┘
///       │                         │
///       ▼                         ▼
///  ┌──────────────────┐     ┌──────────────┐
///  │ train_test_split │     │ SubjectFrame │  named numeric series
///  └──────────────────┘     └──────────────┘
/// ```

pub mod loader;
pub mod model;
