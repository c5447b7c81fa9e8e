//! Curated disease catalog content
//!
//! Per-class descriptive text used by the import binary: scientific
//! names, descriptions, symptoms, treatment, and prevention for the
//! classes the catalog has curated entries for, plus a generic default
//! block for everything else. Healthy classes get boilerplate derived
//! from their display name; only the reference image survives from the
//! curated entry.

use leafguard_common::catalog;

/// Fully resolved catalog content for one class
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub scientific_name: Option<&'static str>,
    pub description: String,
    pub symptoms: String,
    pub treatment: String,
    pub prevention: String,
    pub image_url: Option<&'static str>,
}

struct Info {
    scientific_name: &'static str,
    description: &'static str,
    symptoms: &'static str,
    treatment: &'static str,
    prevention: &'static str,
    image_url: &'static str,
}

const DISEASE_INFO: &[(&str, Info)] = &[
    (
        "Pepper,_bell___Bacterial_spot",
        Info {
            scientific_name: "Xanthomonas campestris pv. vesicatoria",
            description: "Bacterial spot affects bell pepper leaves and fruits, causing dark, water-soaked spots.",
            symptoms: "Small, water-soaked spots on leaves and fruits that turn brown and necrotic.",
            treatment: "Apply copper-based bactericides and remove infected plant debris.",
            prevention: "Use certified disease-free seeds, avoid overhead watering, and rotate crops.",
            image_url: "https://plantpathology.ca.uky.edu/files/ppfs-vg-17.pdf",
        },
    ),
    (
        "Pepper,_bell___healthy",
        Info {
            scientific_name: "",
            description: "Healthy bell pepper plant without any disease symptoms.",
            symptoms: "No visible signs of disease.",
            treatment: "No treatment needed.",
            prevention: "Maintain regular care and good agricultural practices.",
            image_url: "https://upload.wikimedia.org/wikipedia/commons/6/6f/Bell_pepper_plant.jpg",
        },
    ),
    (
        "Potato___Early_blight",
        Info {
            scientific_name: "Alternaria solani",
            description: "Early blight is a common fungal disease in potatoes causing leaf spots and blight.",
            symptoms: "Dark brown spots with concentric rings on older leaves.",
            treatment: "Use fungicides and remove infected leaves.",
            prevention: "Practice crop rotation and proper spacing for airflow.",
            image_url: "https://www.gardeningknowhow.com/wp-content/uploads/2020/07/potato-early-blight.jpg",
        },
    ),
    (
        "Potato___healthy",
        Info {
            scientific_name: "",
            description: "Healthy potato plant without disease symptoms.",
            symptoms: "No visible signs of disease.",
            treatment: "No treatment needed.",
            prevention: "Maintain regular care and good agricultural practices.",
            image_url: "https://upload.wikimedia.org/wikipedia/commons/3/3f/Potato_plants.jpg",
        },
    ),
    (
        "Tomato___Bacterial_spot",
        Info {
            scientific_name: "Xanthomonas campestris pv. vesicatoria",
            description: "Bacterial spot affects tomato leaves, stems, and fruit with dark, necrotic spots.",
            symptoms: "Small brown to black spots on leaves, often with yellow halos.",
            treatment: "Copper-based sprays may help control the spread.",
            prevention: "Use disease-free seeds and improve air circulation.",
            image_url: "https://hort.extension.wisc.edu/wp-content/uploads/sites/117/2021/04/Bacterial-spot-on-tomato-leaves.jpg",
        },
    ),
    (
        "Tomato___Early_blight",
        Info {
            scientific_name: "Alternaria solani",
            description: "A fungal disease causing characteristic concentric ring spots on tomato leaves.",
            symptoms: "Dark brown spots with concentric rings on older leaves, leading to leaf drop.",
            treatment: "Apply appropriate fungicides and remove infected debris.",
            prevention: "Practice crop rotation and maintain good sanitation.",
            image_url: "https://www.epicgardening.com/wp-content/uploads/2021/06/Early-Blight-on-Tomato-Leaf.jpg",
        },
    ),
    (
        "Tomato___healthy",
        Info {
            scientific_name: "",
            description: "Healthy tomato plant with no signs of disease.",
            symptoms: "No visible symptoms.",
            treatment: "No treatment necessary.",
            prevention: "Continue good agricultural practices.",
            image_url: "https://upload.wikimedia.org/wikipedia/commons/8/89/Tomato_plant.jpg",
        },
    ),
    (
        "Tomato___Late_blight",
        Info {
            scientific_name: "Phytophthora infestans",
            description: "A serious disease causing large, dark, greasy lesions on leaves and fruit.",
            symptoms: "Dark, water-soaked spots on leaves, stems, and fruits.",
            treatment: "Apply fungicides and remove infected plants.",
            prevention: "Use resistant varieties and avoid wet foliage.",
            image_url: "https://blogs.cornell.edu/livegpath/files/2019/06/late-blight-tomato.jpg",
        },
    ),
    (
        "Tomato___Leaf_Mold",
        Info {
            scientific_name: "Passalora fulva",
            description: "A fungal disease causing yellow spots on leaves and a grayish mold underneath.",
            symptoms: "Yellow spots on upper leaf surface, with gray mold below.",
            treatment: "Use fungicides and improve air circulation.",
            prevention: "Avoid overhead watering and maintain plant spacing.",
            image_url: "https://extension.umn.edu/sites/extension.umn.edu/files/tomato-leaf-mold.jpg",
        },
    ),
    (
        "Tomato___Septoria_leaf_spot",
        Info {
            scientific_name: "Septoria lycopersici",
            description: "A common fungal disease causing small, circular spots on tomato leaves.",
            symptoms: "Small, circular spots with dark borders and light centers.",
            treatment: "Apply fungicides and remove infected leaves.",
            prevention: "Use crop rotation and avoid overhead watering.",
            image_url: "https://gardenerspath.com/wp-content/uploads/2021/09/Septoria-Leaf-Spot-on-Tomato.jpg",
        },
    ),
    (
        "Tomato___Spider_mites_Two-spotted_spider_mite",
        Info {
            scientific_name: "Tetranychus urticae",
            description: "An infestation of spider mites causing stippling and yellowing of tomato leaves.",
            symptoms: "Tiny yellow spots on leaves, fine webbing on the underside.",
            treatment: "Use insecticidal soaps or miticides.",
            prevention: "Maintain humidity and introduce natural predators.",
            image_url: "https://www.dpi.nsw.gov.au/__data/assets/image/0003/1234567/tomato-spider-mite.jpg",
        },
    ),
    (
        "Tomato___Target_Spot",
        Info {
            scientific_name: "Corynespora cassiicola",
            description: "A fungal disease causing large, circular spots on tomato leaves.",
            symptoms: "Brown spots with concentric rings, often with a yellow halo.",
            treatment: "Use fungicides and remove infected leaves.",
            prevention: "Ensure good air circulation and avoid wet leaves.",
            image_url: "https://plantpath.ifas.ufl.edu/u-scout/tomato/images/target-spot/22161DD2C3964DF39A98F053EB87FBF3/5-13_thumb.png",
        },
    ),
];

/// Generic block for classes with no curated entry
const DEFAULT_INFO: Info = Info {
    scientific_name: "",
    description: "A plant disease affecting plant health and productivity.",
    symptoms: "Various symptoms including spots on leaves, rotting of fruit or stems, and general plant decline.",
    treatment: "Proper identification is key. Treatment may include cultural practices, biological controls, or chemical applications.",
    prevention: "Prevention includes crop rotation, resistant varieties, good sanitation, and proper plant spacing.",
    image_url: "",
};

fn non_empty(value: &'static str) -> Option<&'static str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Resolve the catalog content for a class name
pub fn entry_for(class_name: &str) -> CatalogEntry {
    let info = DISEASE_INFO
        .iter()
        .find(|(key, _)| *key == class_name)
        .map(|(_, info)| info)
        .unwrap_or(&DEFAULT_INFO);

    if catalog::is_healthy_class(class_name) {
        let display = catalog::display_name(class_name);
        CatalogEntry {
            scientific_name: None,
            description: format!("Healthy {} plant without signs of disease.", display),
            symptoms: "No symptoms of disease present.".to_string(),
            treatment: "No treatment necessary as the plant is healthy.".to_string(),
            prevention: "Continue good agricultural practices to maintain plant health.".to_string(),
            image_url: non_empty(info.image_url),
        }
    } else {
        CatalogEntry {
            scientific_name: non_empty(info.scientific_name),
            description: info.description.to_string(),
            symptoms: info.symptoms.to_string(),
            treatment: info.treatment.to_string(),
            prevention: info.prevention.to_string(),
            image_url: non_empty(info.image_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_class_has_scientific_name() {
        let entry = entry_for("Tomato___Late_blight");
        assert_eq!(entry.scientific_name, Some("Phytophthora infestans"));
        assert!(!entry.description.is_empty());
        assert!(entry.image_url.is_some());
    }

    #[test]
    fn test_healthy_class_gets_boilerplate() {
        let entry = entry_for("Potato___healthy");
        assert_eq!(
            entry.description,
            "Healthy Potato - healthy plant without signs of disease."
        );
        assert_eq!(entry.scientific_name, None);
        assert_eq!(entry.symptoms, "No symptoms of disease present.");
        // Reference image survives from the curated entry
        assert!(entry.image_url.is_some());
    }

    #[test]
    fn test_unknown_class_gets_default_block() {
        let entry = entry_for("Grape___Black_rot");
        assert_eq!(entry.scientific_name, None);
        assert_eq!(
            entry.description,
            "A plant disease affecting plant health and productivity."
        );
        assert_eq!(entry.image_url, None);
    }
}
