//! HTML标签提取器
//! 单次分词遍历，收集各分析器需要的页面事实：
//! title、meta、script、样式表、链接锚点、图片、媒体源、h1 计数

use std::cell::{Cell, RefCell};

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

/// meta 标签（name / property 均已小写）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaTag {
    pub name: Option<String>,
    pub property: Option<String>,
    pub content: String,
}

/// 带 href 的锚点
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageTag {
    pub src: Option<String>,
    pub alt: Option<String>,
    pub loading: Option<String>,
}

/// 文本归属：当前字符 token 写入哪里
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TextTarget {
    #[default]
    None,
    Title,
    Anchor(usize),
}

/// 提取结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageDocument {
    pub title: Option<String>,
    pub meta_tags: Vec<MetaTag>,
    pub script_srcs: Vec<String>,
    pub script_count: usize,
    pub stylesheets: Vec<String>,
    pub media_srcs: Vec<String>,
    pub anchors: Vec<Anchor>,
    pub images: Vec<ImageTag>,
    pub h1_count: usize,
}

impl PageDocument {
    /// 去空白后的非空标题
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// 先按 property 再按 name 查找 meta content（Open Graph 习惯）
    pub fn meta_property_first(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.find_meta(|m| m.property.as_deref() == Some(key.as_str()))
            .or_else(|| self.find_meta(|m| m.name.as_deref() == Some(key.as_str())))
    }

    /// 先按 name 再按 property 查找 meta content（Twitter Card 习惯）
    pub fn meta_name_first(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.find_meta(|m| m.name.as_deref() == Some(key.as_str()))
            .or_else(|| self.find_meta(|m| m.property.as_deref() == Some(key.as_str())))
    }

    /// 非空 content
    fn find_meta(&self, pred: impl Fn(&MetaTag) -> bool) -> Option<&str> {
        self.meta_tags
            .iter()
            .filter(|m| pred(m))
            .map(|m| m.content.trim())
            .find(|c| !c.is_empty())
    }

    /// 缺失或空 alt 的图片数量
    pub fn images_missing_alt(&self) -> usize {
        self.images
            .iter()
            .filter(|img| img.alt.as_deref().is_none_or(|a| a.trim().is_empty()))
            .count()
    }

    /// 未声明 loading="lazy" 的图片数量
    pub fn images_without_lazy(&self) -> usize {
        self.images
            .iter()
            .filter(|img| !img.loading.as_deref().is_some_and(|l| l.eq_ignore_ascii_case("lazy")))
            .count()
    }
}

#[derive(Debug, Default, Clone)]
pub struct HtmlExtractor {
    title: RefCell<Option<String>>,
    meta_tags: RefCell<Vec<MetaTag>>,
    script_srcs: RefCell<Vec<String>>,
    script_count: Cell<usize>,
    stylesheets: RefCell<Vec<String>>,
    media_srcs: RefCell<Vec<String>>,
    anchors: RefCell<Vec<Anchor>>,
    images: RefCell<Vec<ImageTag>>,
    h1_count: Cell<usize>,
    text_target: Cell<TextTarget>,
}

impl TokenSink for HtmlExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => self.start_tag(&tag),
                TagKind::EndTag => {
                    self.end_tag(&tag);
                    TokenSinkResult::Continue
                }
            },
            Token::CharacterTokens(text) => {
                self.append_text(&text);
                TokenSinkResult::Continue
            }
            _ => TokenSinkResult::Continue,
        }
    }
}

impl HtmlExtractor {
    /// 创建新的提取器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从HTML字符串提取标签
    pub fn extract(&self, html: &str) -> Self {
        let tokenizer = Tokenizer::new(self.clone(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink
    }

    /// 一步完成解析并取出结果
    pub fn parse(html: &str) -> PageDocument {
        Self::new().extract(html).into_document()
    }

    pub fn into_document(self) -> PageDocument {
        PageDocument {
            title: self.title.into_inner(),
            meta_tags: self.meta_tags.into_inner(),
            script_srcs: self.script_srcs.into_inner(),
            script_count: self.script_count.get(),
            stylesheets: self.stylesheets.into_inner(),
            media_srcs: self.media_srcs.into_inner(),
            anchors: self.anchors.into_inner(),
            images: self.images.into_inner(),
            h1_count: self.h1_count.get(),
        }
    }

    fn start_tag(&self, tag: &Tag) -> TokenSinkResult<()> {
        match tag.name.as_ref() {
            "title" => {
                let mut title = self.title.borrow_mut();
                if title.is_none() {
                    *title = Some(String::new());
                    self.text_target.set(TextTarget::Title);
                }
                if !tag.self_closing {
                    return TokenSinkResult::RawData(RawKind::Rcdata);
                }
            }
            "script" => {
                self.script_count.set(self.script_count.get() + 1);
                if let Some(src) = attr_value(&tag.attrs, "src") {
                    self.script_srcs.borrow_mut().push(src);
                }
                // 脚本体不按标签解析
                if !tag.self_closing {
                    return TokenSinkResult::RawData(RawKind::ScriptData);
                }
            }
            "style" if !tag.self_closing => return TokenSinkResult::RawData(RawKind::Rawtext),
            "meta" => self.extract_meta_tag(&tag.attrs),
            "link" => self.extract_stylesheet(&tag.attrs),
            "a" => {
                if let Some(href) = attr_value(&tag.attrs, "href") {
                    let mut anchors = self.anchors.borrow_mut();
                    anchors.push(Anchor { href, text: String::new() });
                    self.text_target.set(TextTarget::Anchor(anchors.len() - 1));
                }
            }
            "img" => self.images.borrow_mut().push(ImageTag {
                src: attr_value(&tag.attrs, "src"),
                alt: attr_value(&tag.attrs, "alt"),
                loading: attr_value(&tag.attrs, "loading"),
            }),
            "source" => {
                if let Some(src) = attr_value(&tag.attrs, "src") {
                    self.media_srcs.borrow_mut().push(src);
                }
            }
            "h1" => self.h1_count.set(self.h1_count.get() + 1),
            _ => {}
        }
        TokenSinkResult::Continue
    }

    fn end_tag(&self, tag: &Tag) {
        match (tag.name.as_ref(), self.text_target.get()) {
            ("title", TextTarget::Title) | ("a", TextTarget::Anchor(_)) => {
                self.text_target.set(TextTarget::None)
            }
            _ => {}
        }
    }

    fn append_text(&self, text: &str) {
        match self.text_target.get() {
            TextTarget::None => {}
            TextTarget::Title => {
                if let Some(title) = self.title.borrow_mut().as_mut() {
                    title.push_str(text);
                }
            }
            TextTarget::Anchor(idx) => {
                if let Some(anchor) = self.anchors.borrow_mut().get_mut(idx) {
                    anchor.text.push_str(text);
                }
            }
        }
    }

    /// 提取meta标签
    fn extract_meta_tag(&self, attrs: &[Attribute]) {
        let mut meta = MetaTag::default();
        let mut has_content = false;

        for attr in attrs {
            match attr.name.local.as_ref() {
                "name" => meta.name = Some(attr.value.to_lowercase()),
                "property" => meta.property = Some(attr.value.to_lowercase()),
                "content" => {
                    meta.content = attr.value.to_string();
                    has_content = true;
                }
                _ => {}
            }
        }

        if has_content && (meta.name.is_some() || meta.property.is_some()) {
            self.meta_tags.borrow_mut().push(meta);
        }
    }

    /// <link rel="stylesheet" href=...>
    fn extract_stylesheet(&self, attrs: &[Attribute]) {
        let is_stylesheet = attr_value(attrs, "rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|r| r.eq_ignore_ascii_case("stylesheet"))
        });
        if !is_stylesheet {
            return;
        }
        if let Some(href) = attr_value(attrs, "href") {
            self.stylesheets.borrow_mut().push(href);
        }
    }
}

/// 属性值（去空白，空值视为不存在）
fn attr_value(attrs: &[Attribute], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|attr| attr.name.local.as_ref() == name)
        .map(|attr| attr.value.trim().to_string())
        .filter(|v| !v.is_empty() || name == "alt")
}
