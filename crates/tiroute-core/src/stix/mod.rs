//! STIX - STIX 2.1 オブジェクトの型、検証、サニタイズ
//!
//! # 構成
//! - `object`: `StixType`（型付き）/ `StixObject`（型消去）/ `ElementStixObject`
//! - `registry`: `type` ラベル → デコーダ（型を追加してもディスパッチは変わらない）
//! - `common`: 全型共通のプロパティと検証ヘルパー
//! - `domain_objects` / `relationship` / `observables`: 38 の具体型
//!
//! # バッチ処理の方針
//! - 検証は all-or-nothing（最初に失敗した要素の型を返す）
//! - サニタイズは要素ごとのフィルタ（`None` になった要素は捨てる）

pub mod common;
pub mod domain_objects;
pub mod object;
pub mod observables;
pub mod registry;
pub mod relationship;

#[cfg(test)]
pub(crate) mod samples;

pub use self::object::{ElementStixObject, StixObject, StixType};
pub use self::registry::{DynDecoder, StixRegistry, StixRegistryError, TypedDecoder};

use crate::domain::ValidationError;

/// 全要素の型フィールド検証。最初の不正要素の型で失敗する
pub fn check_stix_objects(elements: &[ElementStixObject]) -> Result<(), ValidationError> {
    match elements.iter().find(|e| !e.check_type_fields()) {
        Some(invalid) => Err(ValidationError::InvalidStixObject {
            data_type: invalid.data_type.clone(),
        }),
        None => Ok(()),
    }
}

/// 全要素をサニタイズし、結果が空になった要素を取り除く（順序は維持）
pub fn sanitize_stix_objects(elements: &[ElementStixObject]) -> Vec<ElementStixObject> {
    elements.iter().filter_map(ElementStixObject::sanitize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    use crate::stix::domain_objects::Malware;

    fn batch(values: Vec<Value>) -> Vec<ElementStixObject> {
        StixRegistry::with_default_types()
            .decode_list(&Value::Array(values).to_string())
            .unwrap()
    }

    #[test]
    fn every_builtin_type_has_a_valid_sample() {
        let registry = StixRegistry::with_default_types();
        assert_eq!(registry.registered_types().len(), samples::ALL_TYPES.len());
        for data_type in samples::ALL_TYPES {
            let elements = batch(vec![samples::sample(data_type)]);
            assert_eq!(check_stix_objects(&elements), Ok(()), "{data_type}");
            assert_eq!(sanitize_stix_objects(&elements).len(), 1, "{data_type}");
        }
    }

    #[test]
    fn mixed_batch_of_64_passes_and_keeps_order() {
        let values: Vec<Value> = samples::ALL_TYPES
            .iter()
            .cycle()
            .take(64)
            .map(|t| samples::sample(t))
            .collect();
        let elements = batch(values);

        assert_eq!(check_stix_objects(&elements), Ok(()));
        let clean = sanitize_stix_objects(&elements);
        assert_eq!(clean.len(), 64);
        let types: Vec<_> = clean.iter().map(|e| e.data_type.as_str()).collect();
        let expected: Vec<_> = samples::ALL_TYPES.iter().copied().cycle().take(64).collect();
        assert_eq!(types, expected);
    }

    #[test]
    fn first_invalid_element_is_named() {
        let mut broken_url = samples::sample("url");
        samples::merge(&mut broken_url, json!({"value": "not a url"}));
        let mut broken_tool = samples::sample("tool");
        samples::merge(&mut broken_tool, json!({"name": ""}));

        let elements = batch(vec![samples::sample("malware"), broken_url, broken_tool]);

        assert_eq!(
            check_stix_objects(&elements),
            Err(ValidationError::InvalidStixObject {
                data_type: "url".into()
            })
        );
    }

    #[test]
    fn elements_sanitized_to_nothing_are_dropped() {
        let mut blank = samples::sample("malware");
        samples::merge(&mut blank, json!({"name": "  "}));
        let mut escaped = samples::sample("malware");
        samples::merge(&mut escaped, json!({"name": "<Ivy>"}));

        let elements = batch(vec![samples::sample("mutex"), blank, escaped]);
        let clean = sanitize_stix_objects(&elements);

        assert_eq!(clean.len(), 2);
        assert_eq!(clean[0].data_type, "mutex");
        assert_eq!(clean[1].downcast_ref::<Malware>().unwrap().name, "&lt;Ivy&gt;");
    }

    #[test]
    fn sanitized_batch_serializes_with_labels() {
        let elements = batch(vec![samples::sample("domain-name")]);
        let value = serde_json::to_value(sanitize_stix_objects(&elements)).unwrap();
        assert_eq!(value[0]["data_type"], "domain-name");
        assert_eq!(value[0]["data"]["value"], "example.com");
    }
}
