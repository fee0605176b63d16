//! Mapping from raw classifier labels such as `Tomato___Late_blight` to
//! catalog terms.

use crate::diseases::PlantType;

const LABEL_SEPARATOR: &str = "___";

/// Plant type for a predicted label, by prefix. Unrecognized labels count as tomato.
pub fn plant_type_for_class(predicted_class: &str) -> PlantType {
    if predicted_class.starts_with("Tomato") {
        PlantType::Tomato
    } else if predicted_class.starts_with("Potato") {
        PlantType::Potato
    } else {
        PlantType::Tomato
    }
}

/// Disease name fragment of a label: the segment after `___` with
/// underscores turned into spaces. `None` when there is no usable segment.
pub fn disease_name_for_class(predicted_class: &str) -> Option<String> {
    let segment = predicted_class.split(LABEL_SEPARATOR).nth(1)?;
    let name = segment.replace('_', " ");
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plant_type_from_prefix() {
        assert_eq!(plant_type_for_class("Tomato___Late_blight"), PlantType::Tomato);
        assert_eq!(plant_type_for_class("Potato___Early_blight"), PlantType::Potato);
        assert_eq!(plant_type_for_class("Unknown_X"), PlantType::Tomato);
        assert_eq!(plant_type_for_class("potato___healthy"), PlantType::Tomato);
    }

    #[test]
    fn test_disease_name_from_label() {
        assert_eq!(
            disease_name_for_class("Tomato___Late_blight").as_deref(),
            Some("Late blight")
        );
        assert_eq!(
            disease_name_for_class("Tomato___Spider_mites Two-spotted_spider_mite").as_deref(),
            Some("Spider mites Two-spotted spider mite")
        );
        assert_eq!(disease_name_for_class("Potato___healthy").as_deref(), Some("healthy"));
    }

    #[test]
    fn test_labels_without_disease_segment() {
        assert_eq!(disease_name_for_class("Unknown_X"), None);
        assert_eq!(disease_name_for_class("Tomato___"), None);
        assert_eq!(disease_name_for_class("Tomato______"), None);
    }
}
