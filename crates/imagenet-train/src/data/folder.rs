use std::fs;
use std::path::{Path, PathBuf};

use burn::data::dataset::Dataset;
use derive_new::new;
use walkdir::WalkDir;

use crate::error::{Result, TrainError};

/// File extensions recognised as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp",
];

/// A single sample: where the image lives and the index of its class.
#[derive(new, Clone, Debug, PartialEq, Eq)]
pub struct ImageFolderItem {
    pub path: PathBuf,
    pub label: usize,
}

/// Classification dataset laid out as `root/<class>/**/<image>`.
///
/// Classes are the sorted names of the directories directly under `root`, and a
/// sample's label is the position of its class in that list. Pixels are not read
/// here; see [`ClassificationBatcher`](crate::data::ClassificationBatcher).
#[derive(Clone, Debug)]
pub struct ImageFolder {
    root: PathBuf,
    classes: Vec<String>,
    items: Vec<ImageFolderItem>,
}

impl ImageFolder {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let classes = find_classes(&root)?;

        let mut items = Vec::new();
        for (label, class) in classes.iter().enumerate() {
            let class_dir = root.join(class);
            let found_before = items.len();

            for entry in WalkDir::new(&class_dir)
                .follow_links(true)
                .sort_by_file_name()
            {
                let entry = entry.map_err(|e| TrainError::DatasetIo {
                    path: e.path().unwrap_or(&class_dir).to_path_buf(),
                    source: e.into(),
                })?;
                if entry.file_type().is_file() && has_image_extension(entry.path()) {
                    items.push(ImageFolderItem::new(entry.into_path(), label));
                }
            }

            if items.len() == found_before {
                return Err(TrainError::EmptyClass {
                    class: class.clone(),
                    root,
                });
            }
        }

        log::debug!(
            "Indexed {} images across {} classes in {}",
            items.len(),
            classes.len(),
            root.display()
        );

        Ok(Self {
            root,
            classes,
            items,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn items(&self) -> &[ImageFolderItem] {
        &self.items
    }
}

impl Dataset<ImageFolderItem> for ImageFolder {
    fn get(&self, index: usize) -> Option<ImageFolderItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

fn find_classes(root: &Path) -> Result<Vec<String>> {
    let io_error = |source| TrainError::DatasetIo {
        path: root.to_path_buf(),
        source,
    };

    let mut classes = Vec::new();
    for entry in fs::read_dir(root).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        // `Path::is_dir` follows symlinks, matching how the samples are walked.
        if entry.path().is_dir() {
            classes.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    if classes.is_empty() {
        return Err(TrainError::NoClasses(root.to_path_buf()));
    }
    classes.sort();
    Ok(classes)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn classes_are_sorted_and_labels_follow_them() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "zebra/1.jpg");
        touch(dir.path(), "ant/b.png");
        touch(dir.path(), "ant/a.png");
        touch(dir.path(), "moth/nested/deep.JPEG");

        let folder = ImageFolder::new(dir.path()).unwrap();

        assert_eq!(folder.classes(), ["ant", "moth", "zebra"]);
        let labelled: Vec<_> = folder
            .items()
            .iter()
            .map(|item| {
                let name = item.path.file_name().unwrap().to_string_lossy().into_owned();
                (name, item.label)
            })
            .collect();
        assert_eq!(
            labelled,
            vec![
                ("a.png".to_string(), 0),
                ("b.png".to_string(), 0),
                ("deep.JPEG".to_string(), 1),
                ("1.jpg".to_string(), 2),
            ]
        );
        assert_eq!(folder.len(), 4);
        assert_eq!(folder.get(3).unwrap().label, 2);
        assert!(folder.get(4).is_none());
    }

    #[test]
    fn files_without_image_extension_are_ignored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "cat/photo.jpg");
        touch(dir.path(), "cat/notes.txt");
        touch(dir.path(), "cat/no_extension");
        touch(dir.path(), "README.md");

        let folder = ImageFolder::new(dir.path()).unwrap();

        assert_eq!(folder.classes(), ["cat"]);
        assert_eq!(folder.len(), 1);
    }

    #[test]
    fn root_without_class_folders_is_rejected() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "loose.jpg");

        let err = ImageFolder::new(dir.path()).unwrap_err();

        assert!(matches!(err, TrainError::NoClasses(_)));
    }

    #[test]
    fn class_without_images_is_rejected() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "cat/photo.jpg");
        touch(dir.path(), "dog/readme.txt");

        let err = ImageFolder::new(dir.path()).unwrap_err();

        match err {
            TrainError::EmptyClass { class, .. } => assert_eq!(class, "dog"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_root_reports_the_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = ImageFolder::new(&missing).unwrap_err();

        match err {
            TrainError::DatasetIo { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    #[case("a.jpg", true)]
    #[case("a.JPG", true)]
    #[case("a.webp", true)]
    #[case("a.tiff", true)]
    #[case("a.gif", false)]
    #[case("a.jpg.bak", false)]
    #[case("jpg", false)]
    fn recognises_image_extensions(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(has_image_extension(Path::new(name)), expected);
    }
}
