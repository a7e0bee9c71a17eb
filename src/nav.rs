use crate::records::PlaygroundData;
use crate::state::UiState;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PLAYGROUND_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/playground/([^/]+)/([^/]+)").expect("invalid playground route regex")
});

pub const PLAYGROUNDS_PATH: &str = "/playgrounds";

/// Pages available under each playground in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaygroundPage {
    Dashboard,
    Flows,
    AllRecords,
}

impl PlaygroundPage {
    pub const ALL: [PlaygroundPage; 3] = [
        PlaygroundPage::Dashboard,
        PlaygroundPage::Flows,
        PlaygroundPage::AllRecords,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            PlaygroundPage::Dashboard => "dashboard",
            PlaygroundPage::Flows => "flows",
            PlaygroundPage::AllRecords => "all-records",
        }
    }
}

impl fmt::Display for PlaygroundPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaygroundPage::Dashboard => write!(f, "Dashboard"),
            PlaygroundPage::Flows => write!(f, "Flows"),
            PlaygroundPage::AllRecords => write!(f, "All Records"),
        }
    }
}

impl FromStr for PlaygroundPage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        PlaygroundPage::ALL
            .into_iter()
            .find(|page| page.slug() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown playground page: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Playgrounds,
    Playground { name: String, page: PlaygroundPage },
}

impl Route {
    pub fn playground(name: impl Into<String>, page: PlaygroundPage) -> Self {
        Route::Playground {
            name: name.into(),
            page,
        }
    }

    /// Unknown paths fall back to the playground list.
    pub fn parse(path: &str) -> Self {
        let Some(captures) = PLAYGROUND_PATH.captures(path) else {
            return Route::Playgrounds;
        };

        let name = urlencoding::decode(&captures[1]).ok();
        let page = captures[2].parse::<PlaygroundPage>().ok();
        match (name, page) {
            (Some(name), Some(page)) => Route::playground(name.into_owned(), page),
            _ => Route::Playgrounds,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Playgrounds => PLAYGROUNDS_PATH.to_string(),
            Route::Playground { name, page } => {
                format!("/playground/{}/{}", urlencoding::encode(name), page.slug())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub page: PlaygroundPage,
    pub path: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub name: String,
    pub expanded: bool,
    /// Empty while collapsed.
    pub links: Vec<NavLink>,
}

/// The sidebar: a "Playgrounds" section listing each playground, with its
/// pages shown when expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTree {
    pub playgrounds_active: bool,
    pub section_expanded: bool,
    pub entries: Vec<NavEntry>,
}

impl NavTree {
    pub fn build(playgrounds: &[PlaygroundData], state: &UiState) -> Self {
        let route = state.route();
        let section_expanded = state.is_expanded(crate::state::PLAYGROUNDS_SECTION);

        let entries = if section_expanded {
            playgrounds
                .iter()
                .map(|playground| {
                    let expanded = state.is_expanded(&playground.name);
                    let links = if expanded {
                        PlaygroundPage::ALL
                            .into_iter()
                            .map(|page| {
                                let target = Route::playground(playground.name.clone(), page);
                                NavLink {
                                    page,
                                    path: target.path(),
                                    active: target == route,
                                }
                            })
                            .collect()
                    } else {
                        Vec::new()
                    };
                    NavEntry {
                        name: playground.name.clone(),
                        expanded,
                        links,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            playgrounds_active: route == Route::Playgrounds,
            section_expanded,
            entries,
        }
    }

    /// Plain-text rendering, one line per node; `*` marks the active one.
    pub fn lines(&self) -> Vec<String> {
        let marker = |active: bool| if active { "*" } else { " " };
        let arrow = |expanded: bool| if expanded { "v" } else { ">" };

        let mut lines = vec![format!(
            "{} {} Playgrounds",
            marker(self.playgrounds_active),
            arrow(self.section_expanded)
        )];
        for entry in &self.entries {
            lines.push(format!("    {} {}", arrow(entry.expanded), entry.name));
            for link in &entry.links {
                lines.push(format!("      {} {}", marker(link.active), link.page));
            }
        }
        lines
    }
}
