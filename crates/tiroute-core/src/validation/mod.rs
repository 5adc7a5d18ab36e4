//! Validation - 検索・参照データ要求の検証とサニタイズ、共通ルール
//!
//! STIX オブジェクト個別の検証は `crate::stix` 側（各型が自分で実装）。

pub mod reference_book;
pub mod rules;
pub mod sanitize;
pub mod search;

pub use self::reference_book::ReferenceBookRequest;
pub use self::sanitize::string_sanitize;
pub use self::search::{SearchParameters, SearchRequest, StixSearchParameters};
