//! utterances comment widget

use crate::config::CommentsConfig;
use crate::helpers::html_escape;

/// Script tag loading the comment widget into a post page.
///
/// A widget attaches at most once; later calls return `None`.
#[derive(Debug, Clone)]
pub struct CommentWidget {
    config: CommentsConfig,
    attached: bool,
}

impl CommentWidget {
    pub fn new(config: &CommentsConfig) -> Self {
        Self {
            config: config.clone(),
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// The script element, the first time only
    pub fn attach(&mut self) -> Option<String> {
        if self.attached || !self.config.enable {
            return None;
        }
        self.attached = true;
        Some(self.script_tag())
    }

    fn script_tag(&self) -> String {
        format!(
            r#"<script src="{}" repo="{}" issue-term="{}" label="{}" theme="{}" crossorigin="anonymous" async></script>"#,
            html_escape(&self.config.src),
            html_escape(&self.config.repo),
            html_escape(&self.config.issue_term),
            html_escape(&self.config.label),
            html_escape(&self.config.theme),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_once() {
        let mut widget = CommentWidget::new(&CommentsConfig::default());
        let script = widget.attach().unwrap();
        assert!(widget.is_attached());
        assert_eq!(
            script,
            r#"<script src="https://utteranc.es/client.js" repo="esterfania/space-traveling" issue-term="pathname" label="blog-comment" theme="github-dark" crossorigin="anonymous" async></script>"#
        );
        assert!(widget.attach().is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = CommentsConfig {
            repo: "someone/blog".to_string(),
            theme: "github-light".to_string(),
            ..CommentsConfig::default()
        };
        let script = CommentWidget::new(&config).attach().unwrap();
        assert!(script.contains(r#"repo="someone/blog""#));
        assert!(script.contains(r#"theme="github-light""#));
    }

    #[test]
    fn test_disabled() {
        let config = CommentsConfig {
            enable: false,
            ..CommentsConfig::default()
        };
        assert!(CommentWidget::new(&config).attach().is_none());
    }
}
