use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Dashboard,
    Transactions,
    Reports,
    Family,
    Budget,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Transactions,
        Page::Reports,
        Page::Family,
        Page::Budget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Transactions => "transactions",
            Page::Reports => "reports",
            Page::Family => "family",
            Page::Budget => "budget",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .iter()
            .copied()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| format!("Unknown page: {}", s))
    }
}

/// Tracks the single visible page.
#[derive(Debug, Clone)]
pub struct Navigator {
    active: Page,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            active: Page::Dashboard,
        }
    }

    pub fn active(&self) -> Page {
        self.active
    }

    /// Activates `name`. Unknown names leave the current page visible and
    /// return `None`.
    pub fn navigate(&mut self, name: &str) -> Option<Page> {
        match name.parse::<Page>() {
            Ok(page) => {
                self.active = page;
                Some(page)
            }
            Err(e) => {
                tracing::warn!("{}, staying on {}", e, self.active);
                None
            }
        }
    }

    /// Location fragment change; `""` and `"#"` mean the dashboard.
    pub fn on_fragment_change(&mut self, fragment: &str) -> Option<Page> {
        let name = fragment.strip_prefix('#').unwrap_or(fragment);
        if name.is_empty() {
            self.navigate(Page::Dashboard.as_str())
        } else {
            self.navigate(name)
        }
    }
}
