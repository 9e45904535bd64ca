use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use stepwright_classify::{ClassifierError, Label, RelevanceClassifier, Score};
use stepwright_core::driver::{DriverError, ElementRef, PageDriver};

use super::*;

#[derive(Clone)]
struct MockElement {
    tag: String,
    text: String,
    attrs: HashMap<String, String>,
    clicks: Arc<AtomicU32>,
    filled: Arc<Mutex<Vec<String>>>,
}

impl MockElement {
    fn new(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            text: text.to_string(),
            attrs: HashMap::new(),
            clicks: Arc::new(AtomicU32::new(0)),
            filled: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn link(text: &str, href: &str) -> Self {
        let mut element = Self::new("a", text);
        element.attrs.insert("href".to_string(), href.to_string());
        element
    }
}

#[async_trait]
impl ElementRef for MockElement {
    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.text.clone())
    }

    async fn tag_name(&self) -> Result<String, DriverError> {
        Ok(self.tag.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn scroll_into_view(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn click(&self) -> Result<(), DriverError> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fill(&self, text: &str) -> Result<(), DriverError> {
        self.filled.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn type_text(&self, text: &str, _delay: Duration) -> Result<(), DriverError> {
        self.filled.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// A fake site: per-URL element lists, plus URLs that refuse navigation.
struct SitePage {
    pages: HashMap<String, Vec<MockElement>>,
    current: Mutex<String>,
    navigations: Arc<Mutex<Vec<String>>>,
    fail_goto: HashSet<String>,
}

impl SitePage {
    fn new(pages: Vec<(&str, Vec<MockElement>)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, elements)| (url.to_string(), elements))
                .collect(),
            current: Mutex::new(String::new()),
            navigations: Arc::new(Mutex::new(Vec::new())),
            fail_goto: HashSet::new(),
        }
    }

    fn failing(mut self, url: &str) -> Self {
        self.fail_goto.insert(url.to_string());
        self
    }
}

#[async_trait]
impl PageDriver for SitePage {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        if self.fail_goto.contains(url) {
            return Err(DriverError::Navigation(format!("net::ERR_FAILED {}", url)));
        }
        self.navigations.lock().unwrap().push(url.to_string());
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn wait_for_dom_ready(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn wait_for_network_idle(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Box<dyn ElementRef>, DriverError> {
        Err(DriverError::ElementNotFound(selector.to_string()))
    }

    async fn query_all(&self, _selectors: &str) -> Result<Vec<Box<dyn ElementRef>>, DriverError> {
        let current = self.current.lock().unwrap().clone();
        Ok(self
            .pages
            .get(&current)
            .map(|elements| {
                elements
                    .iter()
                    .map(|e| Box::new(e.clone()) as Box<dyn ElementRef>)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn screenshot(&self, _path: &Path) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Classifier with per-text overrides over a fixed default score.
struct FixedClassifier {
    default: Score,
    by_text: HashMap<String, Score>,
    fail_for: HashSet<String>,
}

impl FixedClassifier {
    fn positive(probability: f32) -> Self {
        Self {
            default: Score {
                label: Label::Positive,
                probability,
            },
            by_text: HashMap::new(),
            fail_for: HashSet::new(),
        }
    }

    fn with_score(mut self, text: &str, label: Label, probability: f32) -> Self {
        self.by_text.insert(
            text.to_string(),
            Score { label, probability },
        );
        self
    }

    fn failing_for(mut self, text: &str) -> Self {
        self.fail_for.insert(text.to_string());
        self
    }
}

#[async_trait]
impl RelevanceClassifier for FixedClassifier {
    async fn score(&self, text: &str, _element_kind: &str) -> Result<Score, ClassifierError> {
        if self.fail_for.contains(text) {
            return Err(ClassifierError::Network("connection reset".to_string()));
        }
        Ok(self.by_text.get(text).copied().unwrap_or(self.default))
    }
}

fn test_config() -> stepwright_config::Config {
    stepwright_config::Config {
        wait_time: 0,
        ..stepwright_config::Config::default()
    }
}

const BASE: &str = "https://site.test/";

#[tokio::test]
async fn test_depth_bound_is_a_noop() {
    let page = SitePage::new(vec![(BASE, vec![MockElement::new("button", "Go")])]);
    let classifier = FixedClassifier::positive(0.9);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(0);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert!(page.navigations.lock().unwrap().is_empty());
    assert!(state.visited().is_empty());
}

#[tokio::test]
async fn test_visited_url_is_only_explored_once() {
    let page = SitePage::new(vec![(BASE, vec![])]);
    let classifier = FixedClassifier::positive(0.9);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(page.navigations.lock().unwrap().len(), 1);
    assert_eq!(state.visited().len(), 1);
}

#[tokio::test]
async fn test_recurses_into_same_origin_links() {
    let about = "https://site.test/about";
    let page = SitePage::new(vec![
        (BASE, vec![MockElement::link("About us", about)]),
        (about, vec![]),
    ]);
    let classifier = FixedClassifier::positive(0.9);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(
        page.navigations.lock().unwrap().as_slice(),
        [BASE, about]
    );
    assert!(state.visited().contains(about));
    assert_eq!(state.current_depth(), 0);
}

#[tokio::test]
async fn test_depth_bound_stops_recursion() {
    let about = "https://site.test/about";
    let page = SitePage::new(vec![
        (BASE, vec![MockElement::link("About us", about)]),
        (about, vec![]),
    ]);
    let classifier = FixedClassifier::positive(0.9);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(1);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    // The descent into /about was refused at the bound.
    assert_eq!(page.navigations.lock().unwrap().as_slice(), [BASE]);
    assert!(!state.visited().contains(about));
}

#[tokio::test]
async fn test_depth_restored_when_recursion_fails() {
    let about = "https://site.test/about";
    let page = SitePage::new(vec![(
        BASE,
        vec![MockElement::link("About us", about)],
    )])
    .failing(about);
    let classifier = FixedClassifier::positive(0.9);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(state.current_depth(), 0);
}

#[tokio::test]
async fn test_classifier_failure_skips_element_not_walk() {
    let broken = MockElement::new("button", "Broken");
    let working = MockElement::new("button", "Working");
    let page = SitePage::new(vec![(BASE, vec![broken.clone(), working.clone()])]);
    let classifier = FixedClassifier::positive(0.9).failing_for("Broken");
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(broken.clicks.load(Ordering::SeqCst), 0);
    assert_eq!(working.clicks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_threshold_for_interactive_tags() {
    let below = MockElement::new("button", "Maybe");
    let above = MockElement::new("button", "Surely");
    let page = SitePage::new(vec![(BASE, vec![below.clone(), above.clone()])]);
    // 0.65 is over the generic 0.5 bar but under the 0.7 bar for buttons.
    let classifier = FixedClassifier::positive(0.75).with_score("Maybe", Label::Positive, 0.65);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(below.clicks.load(Ordering::SeqCst), 0);
    assert_eq!(above.clicks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_negative_label_uses_complement() {
    let button = MockElement::new("button", "Sign up");
    let page = SitePage::new(vec![(BASE, vec![button.clone()])]);
    // Negative at 0.2 means 0.8 likelihood of interactive.
    let classifier = FixedClassifier::positive(0.9).with_score("Sign up", Label::Negative, 0.2);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(button.clicks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_inputs_get_placeholder_value() {
    let input = MockElement::new("input", "Email");
    let page = SitePage::new(vec![(BASE, vec![input.clone()])]);
    let classifier = FixedClassifier::positive(0.9);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(input.filled.lock().unwrap().as_slice(), ["test input"]);
}

#[tokio::test]
async fn test_foreign_links_are_not_followed() {
    let page = SitePage::new(vec![(
        BASE,
        vec![MockElement::link("Elsewhere", "https://other.test/page")],
    )]);
    let classifier = FixedClassifier::positive(0.9);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(page.navigations.lock().unwrap().as_slice(), [BASE]);
}

#[tokio::test]
async fn test_exclude_paths_filter() {
    let admin = "https://site.test/admin/panel";
    let page = SitePage::new(vec![
        (BASE, vec![MockElement::link("Admin", admin)]),
        (admin, vec![]),
    ]);
    let classifier = FixedClassifier::positive(0.9);
    let config = stepwright_config::Config {
        wait_time: 0,
        exclude_paths: vec!["/admin".to_string()],
        ..stepwright_config::Config::default()
    };
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(page.navigations.lock().unwrap().as_slice(), [BASE]);
}

#[tokio::test]
async fn test_allowed_domains_filter() {
    let about = "https://site.test/about";
    let page = SitePage::new(vec![
        (BASE, vec![MockElement::link("About", about)]),
        (about, vec![]),
    ]);
    let classifier = FixedClassifier::positive(0.9);
    let config = stepwright_config::Config {
        wait_time: 0,
        allowed_domains: vec!["elsewhere.test".to_string()],
        ..stepwright_config::Config::default()
    };
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(page.navigations.lock().unwrap().as_slice(), [BASE]);
}

#[tokio::test]
async fn test_select_elements_are_not_acted_on() {
    let select = MockElement::new("select", "Country");
    let page = SitePage::new(vec![(BASE, vec![select.clone()])]);
    let classifier = FixedClassifier::positive(0.9);
    let config = test_config();
    let explorer = Explorer::new(&page, &classifier, &config);

    let mut state = ExplorationState::new(3);
    explorer.explore(BASE.to_string(), &mut state).await.unwrap();

    assert_eq!(select.clicks.load(Ordering::SeqCst), 0);
    assert!(select.filled.lock().unwrap().is_empty());
}
