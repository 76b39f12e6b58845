//! 内置技术签名库（静态声明式数据）
//! 每项技术对应一组规则，规则类型：HTML 正则 / 响应头名+正则 / meta 名+正则 / Cookie 子串
//! 正则统一在编译阶段加 (?i)，此处按原样书写

/// 规则类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Html,
    /// 响应头名（大小写不敏感）
    Header(&'static str),
    /// meta 的 name 或 property
    Meta(&'static str),
    /// Set-Cookie / Cookie 头中出现的子串
    Cookie,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Html => "html",
            RuleKind::Header(_) => "header",
            RuleKind::Meta(_) => "meta",
            RuleKind::Cookie => "cookie",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SignatureRule {
    pub kind: RuleKind,
    pub pattern: &'static str,
    pub confidence: u8,
    /// 版本模板（\1 引用第一个分组）
    pub version: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct TechSignature {
    pub name: &'static str,
    pub categories: &'static [&'static str],
    pub icon: Option<&'static str>,
    pub website: Option<&'static str>,
    pub rules: &'static [SignatureRule],
}

const FIRST_GROUP: Option<&str> = Some("\\1");

pub const fn html(pattern: &'static str, confidence: u8) -> SignatureRule {
    SignatureRule { kind: RuleKind::Html, pattern, confidence, version: None }
}

pub const fn html_versioned(pattern: &'static str, confidence: u8) -> SignatureRule {
    SignatureRule { kind: RuleKind::Html, pattern, confidence, version: FIRST_GROUP }
}

pub const fn header(name: &'static str, pattern: &'static str, confidence: u8) -> SignatureRule {
    SignatureRule { kind: RuleKind::Header(name), pattern, confidence, version: None }
}

pub const fn header_versioned(name: &'static str, pattern: &'static str, confidence: u8) -> SignatureRule {
    SignatureRule { kind: RuleKind::Header(name), pattern, confidence, version: FIRST_GROUP }
}

pub const fn meta(name: &'static str, pattern: &'static str, confidence: u8) -> SignatureRule {
    SignatureRule { kind: RuleKind::Meta(name), pattern, confidence, version: None }
}

pub const fn meta_versioned(name: &'static str, pattern: &'static str, confidence: u8) -> SignatureRule {
    SignatureRule { kind: RuleKind::Meta(name), pattern, confidence, version: FIRST_GROUP }
}

pub const fn cookie(needle: &'static str, confidence: u8) -> SignatureRule {
    SignatureRule { kind: RuleKind::Cookie, pattern: needle, confidence, version: None }
}

pub static TECH_SIGNATURES: &[TechSignature] = &[
    // CMS
    TechSignature {
        name: "WordPress",
        categories: &["CMS", "Blogs"],
        icon: Some("WordPress.svg"),
        website: Some("https://wordpress.org"),
        rules: &[
            meta_versioned("generator", r"WordPress ?([\d.]+)?", 100),
            html(r"wp-content/themes/", 100),
            html(r"wp-includes/", 100),
            cookie("wp-settings-", 100),
        ],
    },
    TechSignature {
        name: "Drupal",
        categories: &["CMS"],
        icon: Some("Drupal.svg"),
        website: Some("https://drupal.org"),
        rules: &[
            meta_versioned("generator", r"Drupal ?([\d.]+)?", 100),
            header_versioned("x-generator", r"Drupal ?([\d.]+)?", 100),
            html(r"sites/all/themes/", 80),
        ],
    },
    TechSignature {
        name: "Joomla",
        categories: &["CMS"],
        icon: Some("Joomla.svg"),
        website: Some("https://joomla.org"),
        rules: &[
            meta("generator", r"Joomla!?", 100),
            header("x-content-encoded-by", r"Joomla!?", 100),
        ],
    },
    TechSignature {
        name: "Shopify",
        categories: &["Ecommerce", "CMS"],
        icon: Some("Shopify.svg"),
        website: Some("https://shopify.com"),
        rules: &[
            html(r"cdn\.shopify\.com", 100),
            html(r"Shopify\.shop", 100),
            cookie("_shopify_y", 100),
        ],
    },
    TechSignature {
        name: "Wix",
        categories: &["Website Builder", "CMS"],
        icon: Some("Wix.svg"),
        website: Some("https://wix.com"),
        rules: &[
            html(r"wix\.com", 80),
            meta("generator", r"Wix\.com Website Builder", 100),
        ],
    },
    TechSignature {
        name: "Squarespace",
        categories: &["Website Builder", "CMS"],
        icon: Some("Squarespace.svg"),
        website: Some("https://squarespace.com"),
        rules: &[
            html(r"static\.squarespace\.com", 100),
            header("x-served-by", r"Squarespace", 100),
        ],
    },
    // JavaScript 框架与库
    TechSignature {
        name: "React",
        categories: &["JavaScript Framework"],
        icon: Some("React.svg"),
        website: Some("https://reactjs.org"),
        rules: &[
            html(r"react\.production\.min\.js", 100),
            html(r"react-dom", 80),
            html(r"data-reactroot", 100),
        ],
    },
    TechSignature {
        name: "Next.js",
        categories: &["JavaScript Framework", "Web Framework"],
        icon: Some("Next.js.svg"),
        website: Some("https://nextjs.org"),
        rules: &[
            html(r"/_next/static/", 100),
            header("x-powered-by", r"Next\.js", 100),
            html(r"__NEXT_DATA__", 100),
        ],
    },
    TechSignature {
        name: "Vue.js",
        categories: &["JavaScript Framework"],
        icon: Some("Vue.js.svg"),
        website: Some("https://vuejs.org"),
        rules: &[html(r"vue\.min\.js", 100), html(r"data-v-[a-z0-9]+", 80)],
    },
    TechSignature {
        name: "Nuxt.js",
        categories: &["JavaScript Framework", "Web Framework"],
        icon: Some("Nuxt.js.svg"),
        website: Some("https://nuxtjs.org"),
        rules: &[html(r"/_nuxt/", 100), html(r"__NUXT__", 100)],
    },
    TechSignature {
        name: "Angular",
        categories: &["JavaScript Framework"],
        icon: Some("Angular.svg"),
        website: Some("https://angular.io"),
        rules: &[html(r"angular\.js", 100), html_versioned(r#"ng-version="([\d.]+)"#, 100)],
    },
    TechSignature {
        name: "jQuery",
        categories: &["JavaScript Library"],
        icon: Some("jQuery.svg"),
        website: Some("https://jquery.com"),
        rules: &[
            html_versioned(r"jquery[.-]?([\d.]*\d)?(?:\.min)?\.js", 100),
            html(r#"<script[^>]+src="[^"]*jquery"#, 80),
        ],
    },
    TechSignature {
        name: "Alpine.js",
        categories: &["JavaScript Framework"],
        icon: Some("Alpine.js.svg"),
        website: Some("https://alpinejs.dev"),
        rules: &[html(r"x-data=", 80), html(r"alpine(?:\.min)?\.js", 100)],
    },
    // Web 服务器
    TechSignature {
        name: "Nginx",
        categories: &["Web Server"],
        icon: Some("Nginx.svg"),
        website: Some("https://nginx.org"),
        rules: &[header_versioned("server", r"nginx/?([\d.]+)?", 100)],
    },
    TechSignature {
        name: "Apache",
        categories: &["Web Server"],
        icon: Some("Apache.svg"),
        website: Some("https://httpd.apache.org"),
        rules: &[header_versioned("server", r"Apache/?([\d.]+)?", 100)],
    },
    TechSignature {
        name: "IIS",
        categories: &["Web Server"],
        icon: Some("IIS.svg"),
        website: Some("https://www.iis.net"),
        rules: &[header_versioned("server", r"IIS/?([\d.]+)?", 100)],
    },
    // CDN / PaaS
    TechSignature {
        name: "Cloudflare",
        categories: &["CDN", "PaaS"],
        icon: Some("Cloudflare.svg"),
        website: Some("https://cloudflare.com"),
        rules: &[header("server", r"cloudflare", 100), header("cf-ray", r".+", 100)],
    },
    TechSignature {
        name: "Vercel",
        categories: &["PaaS", "CDN"],
        icon: Some("Vercel.svg"),
        website: Some("https://vercel.com"),
        rules: &[header("server", r"Vercel", 100), header("x-vercel-id", r".+", 100)],
    },
    TechSignature {
        name: "Netlify",
        categories: &["PaaS", "CDN"],
        icon: Some("Netlify.svg"),
        website: Some("https://netlify.com"),
        rules: &[header("server", r"Netlify", 100)],
    },
    // CSS 框架
    TechSignature {
        name: "Bootstrap",
        categories: &["CSS Framework"],
        icon: Some("Bootstrap.svg"),
        website: Some("https://getbootstrap.com"),
        rules: &[
            html_versioned(r"bootstrap[.-]?([\d.]*\d)?\.min\.css", 100),
            html(r#"class="[^"]*\b(?:col-[a-z]{2}-\d+|btn-primary|navbar-expand)"#, 70),
        ],
    },
    TechSignature {
        name: "Tailwind CSS",
        categories: &["CSS Framework"],
        icon: Some("Tailwind CSS.svg"),
        website: Some("https://tailwindcss.com"),
        rules: &[
            html(r"tailwindcss", 100),
            // 类名启发式，单独命中不足以判定
            html(r#"class="[^"]*\b(?:p-[0-9]|m-[0-9]|bg-[a-z]+-[0-9]{3}|flex|grid)"#, 40),
        ],
    },
    // 统计分析
    TechSignature {
        name: "Google Analytics",
        categories: &["Analytics"],
        icon: Some("Google Analytics.svg"),
        website: Some("https://analytics.google.com"),
        rules: &[
            html(r"google-analytics\.com/analytics\.js", 100),
            html(r"googletagmanager\.com/gtag/js", 100),
            html(r"UA-\d{4,}-\d+", 100),
        ],
    },
    TechSignature {
        name: "Google Tag Manager",
        categories: &["Tag Manager"],
        icon: None,
        website: Some("https://tagmanager.google.com"),
        rules: &[html(r"googletagmanager\.com/gtm\.js", 100), html(r"GTM-[A-Z0-9]+", 100)],
    },
    TechSignature {
        name: "Hotjar",
        categories: &["Analytics"],
        icon: None,
        website: Some("https://hotjar.com"),
        rules: &[html(r"static\.hotjar\.com", 100)],
    },
    // 编程语言
    TechSignature {
        name: "PHP",
        categories: &["Programming Language"],
        icon: None,
        website: Some("https://php.net"),
        rules: &[
            header_versioned("x-powered-by", r"PHP/?(\d+\.[\d.]+)?", 100),
            html(r"\.php", 60),
            cookie("PHPSESSID", 80),
        ],
    },
    TechSignature {
        name: "ASP.NET",
        categories: &["Programming Language"],
        icon: None,
        website: Some("https://dotnet.microsoft.com"),
        rules: &[
            header("x-powered-by", r"ASP\.NET", 100),
            header_versioned("x-aspnet-version", r"([\d.]+)?", 100),
            cookie("ASP.NET_SessionId", 80),
        ],
    },
    TechSignature {
        name: "Python",
        categories: &["Programming Language"],
        icon: None,
        website: Some("https://python.org"),
        rules: &[header("server", r"gunicorn|uvicorn|waitress", 80)],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_unique() {
        let mut names = HashSet::new();
        for sig in TECH_SIGNATURES {
            assert!(names.insert(sig.name), "duplicate signature {}", sig.name);
            assert!(!sig.rules.is_empty());
            assert!(sig.rules.iter().all(|r| r.confidence <= 100));
        }
    }
}
