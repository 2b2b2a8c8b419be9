//! COCO format data structures
//!
//! The document layout follows the instance-segmentation flavour consumed by
//! the detection training code: one license, one category, a blank info block
//! and pixel-space segmentations.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// COCO dataset information. Every field is left blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub contributor: String,
    pub date_created: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub year: String,
}

/// COCO license information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub id: u32,
    pub url: String,
}

/// COCO category information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

/// COCO image information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
    pub license: u32,
    pub flickr_url: String,
    pub coco_url: String,
    pub date_captured: u32,
}

impl Image {
    pub fn new(id: u64, file_name: String, width: u32, height: u32, license: u32) -> Self {
        Self {
            id,
            width,
            height,
            file_name,
            license,
            flickr_url: String::new(),
            coco_url: String::new(),
            date_captured: 0,
        }
    }
}

/// Annotation tool attributes carried on every annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationAttributes {
    pub occluded: String,
}

impl Default for AnnotationAttributes {
    fn default() -> Self {
        Self {
            occluded: "false".to_string(),
        }
    }
}

/// COCO annotation information
///
/// `segmentation` and `bbox` are in pixels while `area` is in squared world
/// units of the source layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u32,
    pub segmentation: Vec<Vec<i64>>,
    pub area: f64,
    pub bbox: [i64; 4], // [x, y, width, height]
    pub iscrowd: u32,
    #[serde(default)]
    pub attributes: AnnotationAttributes,
}

/// Complete COCO dataset structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoFile {
    pub licenses: Vec<License>,
    pub info: Info,
    pub categories: Vec<Category>,
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
}

impl CocoFile {
    /// Serialize to `path`, replacing any previous content.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

/// Fixed header of the generated dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    pub category_id: u32,
    pub category_name: String,
    pub license_id: u32,
    pub license_name: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            category_id: 1,
            category_name: "kiln".to_string(),
            license_id: 0,
            license_name: "Swalim project".to_string(),
        }
    }
}

impl DatasetConfig {
    pub fn licenses(&self) -> Vec<License> {
        vec![License {
            name: self.license_name.clone(),
            id: self.license_id,
            url: String::new(),
        }]
    }

    pub fn categories(&self) -> Vec<Category> {
        vec![Category {
            id: self.category_id,
            name: self.category_name.clone(),
            supercategory: String::new(),
        }]
    }
}
