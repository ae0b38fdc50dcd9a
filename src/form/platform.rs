use serde::{Deserialize, Serialize};
use std::fmt;

/// Applicant tracking system hosting a form, guessed from its url.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsPlatform {
    Greenhouse,
    Lever,
    Workday,
    SmartRecruiters,
    Recruitee,
    BambooHr,
    Workable,
    Unknown,
}

const HOST_MARKERS: &[(&str, AtsPlatform)] = &[
    ("greenhouse.io", AtsPlatform::Greenhouse),
    ("lever.co", AtsPlatform::Lever),
    ("myworkdayjobs.com", AtsPlatform::Workday),
    ("workday.com", AtsPlatform::Workday),
    ("smartrecruiters.com", AtsPlatform::SmartRecruiters),
    ("recruitee.com", AtsPlatform::Recruitee),
    ("bamboohr.com", AtsPlatform::BambooHr),
    ("workable.com", AtsPlatform::Workable),
];

impl AtsPlatform {
    pub fn detect(raw_url: &str) -> Self {
        let host = url::Url::parse(raw_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()));

        let Some(host) = host else {
            return AtsPlatform::Unknown;
        };

        HOST_MARKERS
            .iter()
            .find(|(marker, _)| host == *marker || host.ends_with(&format!(".{}", marker)))
            .map(|(_, platform)| *platform)
            .unwrap_or(AtsPlatform::Unknown)
    }

    /// Whether this platform usually embeds its form in an inline frame on the employer's site.
    pub fn embeds_in_frame(&self) -> bool {
        matches!(
            self,
            AtsPlatform::Greenhouse | AtsPlatform::Lever | AtsPlatform::Workable
        )
    }

    /// Host fragment identifying this platform's pages, usable as a frame hint.
    pub fn host_marker(&self) -> Option<&'static str> {
        HOST_MARKERS
            .iter()
            .find(|(_, platform)| platform == self)
            .map(|(marker, _)| *marker)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AtsPlatform::Greenhouse => "greenhouse",
            AtsPlatform::Lever => "lever",
            AtsPlatform::Workday => "workday",
            AtsPlatform::SmartRecruiters => "smart_recruiters",
            AtsPlatform::Recruitee => "recruitee",
            AtsPlatform::BambooHr => "bamboo_hr",
            AtsPlatform::Workable => "workable",
            AtsPlatform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AtsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_known_hosts() {
        assert_eq!(
            AtsPlatform::detect("https://boards.greenhouse.io/acme/jobs/123"),
            AtsPlatform::Greenhouse
        );
        assert_eq!(
            AtsPlatform::detect("https://jobs.lever.co/acme/abc/apply"),
            AtsPlatform::Lever
        );
        assert_eq!(
            AtsPlatform::detect("https://acme.wd3.myworkdayjobs.com/en-US/careers"),
            AtsPlatform::Workday
        );
        assert_eq!(
            AtsPlatform::detect("https://acme.recruitee.com/o/rust-dev"),
            AtsPlatform::Recruitee
        );
    }

    #[test]
    fn test_display_matches_serde_label() {
        assert_eq!(
            AtsPlatform::detect("https://boards.greenhouse.io/x").to_string(),
            "greenhouse"
        );
        let platforms = [
            AtsPlatform::SmartRecruiters,
            AtsPlatform::BambooHr,
            AtsPlatform::Unknown,
        ];
        for platform in platforms {
            let json = serde_json::to_string(&platform).unwrap();
            assert_eq!(json, format!("\"{}\"", platform));
        }
    }

    #[test]
    fn test_frame_embedding_platforms_have_markers() {
        assert_eq!(AtsPlatform::Greenhouse.host_marker(), Some("greenhouse.io"));
        assert_eq!(AtsPlatform::Workday.host_marker(), Some("myworkdayjobs.com"));
        assert_eq!(AtsPlatform::Unknown.host_marker(), None);
        assert!(AtsPlatform::Workable.embeds_in_frame());
        assert!(!AtsPlatform::Workday.embeds_in_frame());
    }

    #[test]
    fn test_lookalikes_and_garbage_are_unknown() {
        assert_eq!(
            AtsPlatform::detect("https://notgreenhouse.io.example.com/jobs"),
            AtsPlatform::Unknown
        );
        assert_eq!(AtsPlatform::detect("not a url"), AtsPlatform::Unknown);
        assert_eq!(
            AtsPlatform::detect("https://careers.acme.nl/vacatures/1"),
            AtsPlatform::Unknown
        );
    }
}
