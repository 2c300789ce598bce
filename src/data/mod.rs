/// Data layer: the license-expiry pipeline.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RecordSet (bad dates → None)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  days until expiry → StatusCategory
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │ summary   │   │  filter   │  facet selection → indices
///   └──────────┘   └──────────┘
///                       │
///                       ▼
///                  ┌──────────┐
///                  │  export   │  urgency sort → follow_up_report.xlsx
///                  └──────────┘
/// ```

pub mod classify;
pub mod dates;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
