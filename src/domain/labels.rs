//! Crop label space and the bijective name ⇄ index mapping.

use serde::{Deserialize, Serialize};

use super::ModelError;

/// The 22 crops of the reference training set, in encoder order.
pub const STANDARD_CROPS: [&str; 22] = [
    "apple",
    "banana",
    "blackgram",
    "chickpea",
    "coconut",
    "coffee",
    "cotton",
    "grapes",
    "jute",
    "kidneybeans",
    "lentil",
    "maize",
    "mango",
    "mothbeans",
    "mungbean",
    "muskmelon",
    "orange",
    "papaya",
    "pigeonpeas",
    "pomegranate",
    "rice",
    "watermelon",
];

/// Label encoder over a fixed set of crop names.
///
/// Classes are kept sorted, so index `i` is the `i`-th class name in
/// lexicographic order. This matches how the trained encoder assigns
/// indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderRepr", into = "EncoderRepr")]
pub struct CropLabelEncoder {
    classes: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct EncoderRepr {
    classes: Vec<String>,
}

impl TryFrom<EncoderRepr> for CropLabelEncoder {
    type Error = String;

    fn try_from(repr: EncoderRepr) -> Result<Self, Self::Error> {
        Self::from_classes(repr.classes)
    }
}

impl From<CropLabelEncoder> for EncoderRepr {
    fn from(encoder: CropLabelEncoder) -> Self {
        Self {
            classes: encoder.classes,
        }
    }
}

impl CropLabelEncoder {
    /// Build an encoder from class names.
    ///
    /// # Errors
    /// Returns error if the list is empty or contains duplicates.
    pub fn from_classes<I, S>(classes: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        if classes.is_empty() {
            return Err("Label encoder needs at least one class".to_string());
        }

        classes.sort();
        if let Some(dup) = classes.windows(2).find(|w| w[0] == w[1]) {
            return Err(format!("Duplicate class name: {:?}", dup[0]));
        }

        Ok(Self { classes })
    }

    /// Encoder over the 22 standard crops.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            classes: STANDARD_CROPS.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Index of a class name.
    ///
    /// # Errors
    /// Returns `ModelError::UnknownClass` for names outside the label space.
    pub fn encode(&self, name: &str) -> Result<usize, ModelError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(name))
            .map_err(|_| ModelError::UnknownClass(name.to_string()))
    }

    /// Class name of an index.
    ///
    /// # Errors
    /// Returns `ModelError::UnknownLabel` for indices outside the label space.
    pub fn decode(&self, index: usize) -> Result<&str, ModelError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(ModelError::UnknownLabel {
                index,
                n_classes: self.classes.len(),
            })
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
