use std::fs;
use std::path::Path;

/// The classifier's fixed, ordered label set. Index `i` names output `i` of the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNames(Vec<String>);

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        ClassNames(names)
    }

    pub fn parse(content: &str) -> Self {
        ClassNames(
            content
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    //missing file gives an empty set
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => {
                let names = Self::parse(&content);
                log::info!("loaded {} class names from {}", names.len(), path.display());
                names
            }
            Err(e) => {
                log::warn!("class names file {} not readable: {}", path.display(), e);
                ClassNames::default()
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_trims_and_drops_blanks() {
        let names = ClassNames::parse(" apple_pie,baklava ,\n, pizza,\n");
        assert_eq!(names.len(), 3);
        assert_eq!(names.get(0), Some("apple_pie"));
        assert_eq!(names.get(1), Some("baklava"));
        assert_eq!(names.get(2), Some("pizza"));
        assert_eq!(names.get(3), None);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "sushi,ramen").unwrap();
        let names = ClassNames::load(file.path());
        assert_eq!(names.to_vec(), vec!["sushi".to_string(), "ramen".to_string()]);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let names = ClassNames::load(&dir.path().join("nope.txt"));
        assert!(names.is_empty());
    }

    #[test]
    fn bundled_list_has_every_food101_class() {
        let names = ClassNames::parse(include_str!("../../resources/class_names.txt"));
        assert_eq!(names.len(), 101);
        assert_eq!(names.get(0), Some("apple_pie"));
        assert!(names.to_vec().iter().any(|n| n == "pizza"));
    }
}
