use crate::diseases::models::{NewDisease, PlantType, Severity};

struct Entry {
    name: &'static str,
    scientific_name: Option<&'static str>,
    plant_type: PlantType,
    description: &'static str,
    symptoms: &'static str,
    treatment: &'static str,
    prevention: &'static str,
    severity: Severity,
}

const ENTRIES: &[Entry] = &[
    // Tomato
    Entry {
        name: "Late Blight",
        scientific_name: Some("Phytophthora infestans"),
        plant_type: PlantType::Tomato,
        description: "Late blight is a devastating disease that affects tomato plants. It is caused by the water mold Phytophthora infestans and can quickly destroy entire crops if left untreated.",
        symptoms: "Water-soaked spots on leaves that turn brown and dry out. White fungal growth may appear on the underside of leaves. Stems may develop dark streaks, and fruit develops firm brown lesions.",
        treatment: "Remove and destroy infected plants immediately. Apply copper-based fungicides or other approved fungicides. Ensure good air circulation and avoid overhead watering. Plant resistant varieties when possible.",
        prevention: "Use certified disease-free seeds and transplants. Avoid planting in areas where late blight occurred previously. Space plants adequately for air circulation. Water at the base of plants in the morning. Remove plant debris promptly.",
        severity: Severity::High,
    },
    Entry {
        name: "Early Blight",
        scientific_name: Some("Alternaria solani"),
        plant_type: PlantType::Tomato,
        description: "Early blight is a common tomato disease caused by the fungus Alternaria solani. It typically affects older plants and can cause significant yield loss if not managed.",
        symptoms: "Dark brown spots with concentric rings (target-like pattern) on older lower leaves. Leaves may yellow and drop. Stems may develop lesions. Fruit may show dark, leathery spots near the stem end.",
        treatment: "Remove affected leaves and destroy them. Apply fungicides containing chlorothalonil, copper, or mancozeb. Stake and prune plants for better air circulation. Mulch around plants to prevent soil splash.",
        prevention: "Rotate crops on a 3-year cycle. Use disease-free seeds and transplants. Space plants adequately. Apply mulch to prevent soil-borne spores from splashing onto leaves. Water at the base of plants.",
        severity: Severity::Medium,
    },
    Entry {
        name: "Healthy",
        scientific_name: None,
        plant_type: PlantType::Tomato,
        description: "The plant appears healthy with no visible signs of disease or pest damage.",
        symptoms: "Green, vibrant foliage with no spots or discoloration. Normal growth pattern. No wilting or unusual leaf patterns.",
        treatment: "Continue regular care and maintenance. Monitor plants regularly for any signs of disease or pests.",
        prevention: "Maintain proper watering, fertilization, and spacing. Practice crop rotation. Inspect plants regularly. Remove dead plant material promptly.",
        severity: Severity::Low,
    },
    // Potato
    Entry {
        name: "Late Blight",
        scientific_name: Some("Phytophthora infestans"),
        plant_type: PlantType::Potato,
        description: "Late blight is one of the most serious diseases of potato, capable of destroying entire fields in a matter of days under favorable conditions. It is the same pathogen that caused the Irish Potato Famine.",
        symptoms: "Water-soaked spots on leaves that quickly enlarge and turn brown or black. White fungal growth appears on the underside of leaves in humid conditions. Tubers develop firm, dry, brown to purplish rot.",
        treatment: "Remove and destroy infected plants and tubers. Apply protective fungicides before disease appears and continue at regular intervals. Harvest tubers promptly when mature. Cure and store properly.",
        prevention: "Plant certified disease-free seed potatoes. Space plants adequately for air circulation. Avoid overhead irrigation. Hill potatoes deeply to protect tubers. Remove volunteer potatoes and cull piles. Use resistant varieties.",
        severity: Severity::High,
    },
    Entry {
        name: "Early Blight",
        scientific_name: Some("Alternaria solani"),
        plant_type: PlantType::Potato,
        description: "Early blight is a common potato disease that primarily affects foliage but can also impact tubers. It typically appears in mid to late season and can reduce yields significantly.",
        symptoms: "Brown to black spots with concentric rings (target pattern) on older leaves. Leaves turn yellow and drop prematurely. Stems may have dark, slightly sunken lesions. Tubers may show dark, corky lesions.",
        treatment: "Remove and destroy affected foliage. Apply fungicides as needed. Maintain plant vigor through proper nutrition and watering. Harvest tubers when mature and allow proper curing.",
        prevention: "Use certified disease-free seed potatoes. Practice 3-4 year crop rotation. Maintain adequate plant spacing. Avoid overhead watering or water early in the day. Remove plant debris after harvest. Apply mulch.",
        severity: Severity::Medium,
    },
    Entry {
        name: "Healthy",
        scientific_name: None,
        plant_type: PlantType::Potato,
        description: "The plant shows no signs of disease and appears to be growing normally with healthy foliage.",
        symptoms: "Green, healthy foliage. Normal growth and development. No spots, discoloration, or wilting.",
        treatment: "Continue regular maintenance and monitoring. Ensure proper nutrition and watering.",
        prevention: "Practice crop rotation. Use certified seed potatoes. Maintain proper spacing and avoid overwatering. Remove plant debris. Monitor regularly for pests and diseases.",
        severity: Severity::Low,
    },
];

/// Reference rows inserted into an empty `diseases` table at startup.
pub fn default_catalog() -> Vec<NewDisease> {
    ENTRIES
        .iter()
        .map(|e| NewDisease {
            name: e.name.to_string(),
            scientific_name: e.scientific_name.map(str::to_string),
            plant_type: e.plant_type,
            description: e.description.to_string(),
            symptoms: e.symptoms.to_string(),
            treatment: e.treatment.to_string(),
            prevention: e.prevention.to_string(),
            severity: e.severity,
            is_active: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_both_plants() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 6);

        for plant in [PlantType::Tomato, PlantType::Potato] {
            let names: Vec<_> = catalog
                .iter()
                .filter(|d| d.plant_type == plant)
                .map(|d| d.name.as_str())
                .collect();
            assert_eq!(names, vec!["Late Blight", "Early Blight", "Healthy"]);
        }
        assert!(catalog.iter().all(|d| d.is_active));
    }
}
