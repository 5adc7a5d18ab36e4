//! StixRegistry - STIX 型ラベル → デコーダの登録と管理
//!
//! # 内部実装
//! - `register::<T: StixType>()` で登録
//! - 内部的に `TypedDecoder<T>` でラップして `DynDecoder` に変換
//! - `HashMap<&'static str, Arc<dyn DynDecoder>>` で管理

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::value::RawValue;

use super::domain_objects::{
    AttackPattern, Campaign, CourseOfAction, Grouping, Identity, Indicator, Infrastructure,
    IntrusionSet, Location, Malware, MalwareAnalysis, Note, ObservedData, Opinion, Report,
    ThreatActor, Tool, Vulnerability,
};
use super::object::{ElementStixObject, StixObject, StixType};
use super::observables::{
    Artifact, AutonomousSystem, Directory, DomainName, EmailAddr, EmailMessage, File, Ipv4Addr,
    Ipv6Addr, MacAddr, Mutex, NetworkTraffic, Process, Software, Url, UserAccount,
    WindowsRegistryKey, X509Certificate,
};
use super::relationship::{Relationship, Sighting};
use crate::domain::DecodeError;

/// object-safe なデコーダ
pub trait DynDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Arc<dyn StixObject>, serde_json::Error>;
    fn data_type(&self) -> &'static str;
}

pub struct TypedDecoder<T: StixType> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: StixType> TypedDecoder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: StixType> Default for TypedDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StixType> DynDecoder for TypedDecoder<T> {
    fn decode(&self, raw: &str) -> Result<Arc<dyn StixObject>, serde_json::Error> {
        let object: T = serde_json::from_str(raw)?;
        Ok(Arc::new(object))
    }

    fn data_type(&self) -> &'static str {
        T::TYPE
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StixRegistryError {
    #[error("decoder for STIX type '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Reads only the `type` label of an element.
#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "type", default)]
    data_type: Option<String>,
}

#[derive(Default, Clone)]
pub struct StixRegistry {
    decoders: HashMap<&'static str, Arc<dyn DynDecoder>>,
}

impl StixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// STIX 2.1 の 38 型を登録済みのレジストリ
    pub fn with_default_types() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        macro_rules! register_all {
            ($($ty:ty),* $(,)?) => {
                $(
                    let registered = self.register::<$ty>();
                    debug_assert!(
                        registered.is_ok(),
                        "built-in STIX label registered twice: {registered:?}"
                    );
                )*
            };
        }

        register_all!(
            AttackPattern, Campaign, CourseOfAction, Grouping, Identity, Indicator,
            Infrastructure, IntrusionSet, Location, Malware, MalwareAnalysis, Note,
            ObservedData, Opinion, Report, ThreatActor, Tool, Vulnerability,
            Relationship, Sighting,
            Artifact, AutonomousSystem, Directory, DomainName, EmailAddr, EmailMessage, File,
            Ipv4Addr, Ipv6Addr, MacAddr, Mutex, NetworkTraffic, Process, Software, Url,
            UserAccount, WindowsRegistryKey, X509Certificate,
        );
    }

    pub fn register<T: StixType>(&mut self) -> Result<(), StixRegistryError> {
        if self.decoders.contains_key(T::TYPE) {
            return Err(StixRegistryError::AlreadyRegistered(T::TYPE.to_string()));
        }
        self.decoders
            .insert(T::TYPE, Arc::new(TypedDecoder::<T>::new()));
        Ok(())
    }

    pub fn get(&self, data_type: &str) -> Option<Arc<dyn DynDecoder>> {
        self.decoders.get(data_type).cloned()
    }

    pub fn contains(&self, data_type: &str) -> bool {
        self.decoders.contains_key(data_type)
    }

    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.decoders.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decode `details` (a JSON array) into tagged elements, in input order.
    pub fn decode_list(&self, details: &str) -> Result<Vec<ElementStixObject>, DecodeError> {
        let raw_items: Vec<&RawValue> =
            serde_json::from_str(details).map_err(DecodeError::Details)?;

        raw_items
            .into_iter()
            .enumerate()
            .map(|(index, raw)| self.decode_one(index, raw.get()))
            .collect()
    }

    fn decode_one(&self, index: usize, raw: &str) -> Result<ElementStixObject, DecodeError> {
        let probe: TypeProbe = serde_json::from_str(raw).map_err(DecodeError::Details)?;
        let data_type = probe
            .data_type
            .filter(|t| !t.is_empty())
            .ok_or(DecodeError::MissingStixType { index })?;

        let decoder = self
            .get(&data_type)
            .ok_or_else(|| DecodeError::UnknownStixType(data_type.clone()))?;

        let data = decoder
            .decode(raw)
            .map_err(|source| DecodeError::StixObject { data_type, source })?;

        Ok(ElementStixObject {
            data_type: decoder.data_type().to_string(),
            data,
        })
    }
}

impl std::fmt::Debug for StixRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StixRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}
