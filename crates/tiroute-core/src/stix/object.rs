//! StixType / StixObject - STIX オブジェクトの型付き層と型消去層
//!
//! - `StixType`: 具体型ごとの検証・サニタイズ（ジェネリック、`const TYPE` を持つ）
//! - `StixObject`: object-safe な抽象化。`Arc<dyn StixObject>` として扱う
//! - blanket impl で全ての `StixType` が自動的に `StixObject` になる
//!
//! 新しい型を追加しても、ディスパッチ側のコードは変わらない。

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use serde::ser::{Error as _, SerializeStruct};
use serde::{Serialize, Serializer, de::DeserializeOwned};

/// 具体的な STIX オブジェクト型
///
/// # 使用例
/// ```ignore
/// impl StixType for Malware {
///     const TYPE: &'static str = "malware";
///
///     fn check_type_fields(&self) -> bool {
///         self.common.check(Self::TYPE) && has_text(&self.name)
///     }
///
///     fn sanitize_struct(mut self) -> Option<Self> {
///         sanitized_required(&mut self.name)?;
///         Some(self)
///     }
/// }
/// ```
pub trait StixType: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// `type` プロパティの値（例: `"indicator"`）
    const TYPE: &'static str;

    /// 必須フィールドと型付きフィールドが構造的に正しいか
    fn check_type_fields(&self) -> bool;

    /// 自由記述フィールドを無害化したコピー。`None` は「この要素を捨てる」
    fn sanitize_struct(self) -> Option<Self>;
}

/// object-safe な STIX オブジェクト
pub trait StixObject: Debug + Send + Sync {
    fn data_type(&self) -> &'static str;
    fn check_type_fields(&self) -> bool;
    fn sanitize(&self) -> Option<Arc<dyn StixObject>>;
    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: StixType> StixObject for T {
    fn data_type(&self) -> &'static str {
        T::TYPE
    }

    fn check_type_fields(&self) -> bool {
        StixType::check_type_fields(self)
    }

    fn sanitize(&self) -> Option<Arc<dyn StixObject>> {
        self.clone()
            .sanitize_struct()
            .map(|clean| Arc::new(clean) as Arc<dyn StixObject>)
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 型ラベル + 多相ペイロード
#[derive(Debug, Clone)]
pub struct ElementStixObject {
    pub data_type: String,
    pub data: Arc<dyn StixObject>,
}

impl ElementStixObject {
    pub fn new<T: StixType>(object: T) -> Self {
        Self {
            data_type: T::TYPE.to_string(),
            data: Arc::new(object),
        }
    }

    pub fn check_type_fields(&self) -> bool {
        self.data.check_type_fields()
    }

    /// Sanitized copy, `None` when the element should be dropped.
    pub fn sanitize(&self) -> Option<Self> {
        self.data.sanitize().map(|data| Self {
            data_type: self.data_type.clone(),
            data,
        })
    }

    /// Typed view of the payload.
    pub fn downcast_ref<T: StixType>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref::<T>()
    }
}

impl Serialize for ElementStixObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = self.data.to_value().map_err(S::Error::custom)?;
        let mut state = serializer.serialize_struct("ElementStixObject", 2)?;
        state.serialize_field("data_type", &self.data_type)?;
        state.serialize_field("data", &data)?;
        state.end()
    }
}
