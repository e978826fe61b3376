use crate::extract::metadata::PageMetadata;

/// Header fields of one result document.
///
/// Populated opportunistically from whichever page carries them. A field, once
/// set, is never overwritten for the remainder of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub institute_code: Option<String>,
    pub institute_name: Option<String>,
    pub district: Option<String>,
    pub result_date: Option<String>,
    pub semester: Option<String>,
    pub regulation: Option<String>,
    pub trade: Option<String>,
    pub examination_held: Option<String>,
}

impl DocumentMetadata {
    /// Merges the fields found on one page into the unset fields of the document.
    ///
    /// Returns `true` when at least one field was newly set.
    pub fn absorb(&mut self, page: PageMetadata) -> bool {
        let mut changed = false;

        if let Some(institute) = page.institute {
            if self.institute_code.is_none() {
                self.institute_code = Some(institute.code);
                self.institute_name = Some(institute.name);
                self.district = Some(institute.district);
                changed = true;
            }
        }

        if let Some(header) = page.semester {
            changed |= set_once(&mut self.semester, header.semester);
            changed |= set_once(&mut self.regulation, header.regulation);
            changed |= set_once(&mut self.trade, header.trade);
        }

        if let Some(date) = page.result_date {
            changed |= set_once(&mut self.result_date, date);
        }
        if let Some(held) = page.examination_held {
            changed |= set_once(&mut self.examination_held, held);
        }

        changed
    }

    /// Whether every header field has been found, after which pages no longer need
    /// to be searched.
    pub fn is_complete(&self) -> bool {
        self.institute_code.is_some()
            && self.result_date.is_some()
            && self.semester.is_some()
            && self.regulation.is_some()
            && self.trade.is_some()
            && self.examination_held.is_some()
    }
}

fn set_once(slot: &mut Option<String>, value: String) -> bool {
    if slot.is_none() {
        *slot = Some(value);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::metadata::{Institute, SemesterHeader};

    fn institute(code: &str) -> Institute {
        Institute {
            code: code.to_string(),
            name: "Rajshahi Polytechnic Institute".to_string(),
            district: "Rajshahi".to_string(),
        }
    }

    #[test]
    fn test_absorb_sets_unset_fields() {
        let mut metadata = DocumentMetadata::default();
        let changed = metadata.absorb(PageMetadata {
            institute: Some(institute("54321")),
            result_date: Some("15-03-2024".to_string()),
            ..Default::default()
        });

        assert!(changed);
        assert_eq!(metadata.institute_code.as_deref(), Some("54321"));
        assert_eq!(metadata.district.as_deref(), Some("Rajshahi"));
        assert_eq!(metadata.result_date.as_deref(), Some("15-03-2024"));
        assert!(!metadata.is_complete());
    }

    #[test]
    fn test_absorb_never_overwrites() {
        let mut metadata = DocumentMetadata::default();
        metadata.absorb(PageMetadata {
            institute: Some(institute("54321")),
            result_date: Some("15-03-2024".to_string()),
            ..Default::default()
        });

        let changed = metadata.absorb(PageMetadata {
            institute: Some(institute("11111")),
            result_date: Some("01-01-2020".to_string()),
            ..Default::default()
        });

        assert!(!changed);
        assert_eq!(metadata.institute_code.as_deref(), Some("54321"));
        assert_eq!(metadata.result_date.as_deref(), Some("15-03-2024"));
    }

    #[test]
    fn test_complete_after_all_headers() {
        let mut metadata = DocumentMetadata::default();
        metadata.absorb(PageMetadata {
            institute: Some(institute("54321")),
            result_date: Some("15-03-2024".to_string()),
            semester: Some(SemesterHeader {
                semester: "3rd".to_string(),
                regulation: "2022".to_string(),
                trade: "Diploma in Engineering".to_string(),
            }),
            examination_held: Some("January, 2024".to_string()),
        });

        assert!(metadata.is_complete());
        assert_eq!(metadata.semester.as_deref(), Some("3rd"));
    }
}
