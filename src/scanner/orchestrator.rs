//! 扫描编排：预检 → 渲染 → 八个分析器并发扇出 → 聚合

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use futures::stream::{self, FuturesUnordered, Stream, StreamExt};
use futures::FutureExt;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use super::aggregator::compute_global_score;
use super::progress::{ProgressEvent, step};
use super::renderer::{NoRenderer, Renderer};
use crate::analyzer::{
    Analyzer, BrokenLinksAnalyzer, DnsHealthAnalyzer, GdprAnalyzer, GreenItAnalyzer, ScanContext, SecurityAnalyzer,
    SeoAnalyzer, SocialPreviewAnalyzer, TechStackAnalyzer,
};
use crate::config::GlobalConfig;
use crate::error::{AuditError, AuditResult};
use crate::model::{AnalysisResult, Dimension, DimensionReport, DimensionResult, ScanStatus, Winner};
use crate::net::{HttpProbe, ResponseHeaders};

/// 头部数少于该值时预检改用 GET
const MIN_PREFLIGHT_HEADERS: usize = 3;

type DimensionOutcome = (Dimension, AuditResult<DimensionReport>);

/// 扫描器：持有共享的探测客户端与渲染器，可克隆，多次扫描互不影响
#[derive(Clone)]
pub struct Scanner {
    probe: HttpProbe,
    renderer: Arc<dyn Renderer>,
}

impl Scanner {
    pub fn new(config: GlobalConfig) -> AuditResult<Self> {
        Ok(Self {
            probe: HttpProbe::new(Arc::new(config))?,
            renderer: Arc::new(NoRenderer),
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &GlobalConfig {
        self.probe.config()
    }

    pub fn probe(&self) -> &HttpProbe {
        &self.probe
    }

    /// 单次扫描；只有预检失败会返回 Err
    pub async fn run_scan(&self, url: &str, language: &str) -> AuditResult<AnalysisResult> {
        self.execute(url, language, None).await
    }

    /// 流式扫描：最后一个事件为 complete 或 error
    pub fn run_scan_stream(&self, url: &str, language: &str) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        let (tx, rx) = mpsc::unbounded_channel();
        let scanner = self.clone();
        let url = url.to_string();
        let language = language.to_string();

        tokio::spawn(async move {
            match scanner.execute(&url, &language, Some(&tx)).await {
                Ok(result) => emit(Some(&tx), ProgressEvent::complete(result)),
                Err(e) => emit(Some(&tx), ProgressEvent::error(e.to_string())),
            }
        });

        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|event| (event, rx)) })
    }

    /// 对比模式：两次扫描并发；竞品失败只记入 errors
    pub async fn compare(&self, target: &str, competitor: &str, language: &str) -> AuditResult<AnalysisResult> {
        let (target_result, competitor_result) =
            tokio::join!(self.run_scan(target, language), self.run_scan(competitor, language));

        let mut result = target_result?;
        result.versus_mode = true;
        match competitor_result {
            Ok(other) => {
                result.winner = Some(decide_winner(result.global_score(), other.global_score()));
                result.competitor = Some(Box::new(other));
            }
            Err(e) => {
                warn!("Competitor scan of {} failed: {}", competitor, e);
                result.errors.push(format!("Competitor scan failed: {}", e));
            }
        }
        Ok(result)
    }

    async fn execute(
        &self,
        url: &str,
        language: &str,
        events: Option<&UnboundedSender<ProgressEvent>>,
    ) -> AuditResult<AnalysisResult> {
        let started = Instant::now();
        emit(events, ProgressEvent::log(step::INIT, format!("Starting analysis of {}", url)));

        let headers = match self.preflight(url).await {
            Ok(headers) => headers,
            Err(e) => {
                warn!("Preflight for {} failed: {}", url, e);
                emit(events, ProgressEvent::log(step::NETWORK, format!("Target unreachable: {}", e)));
                return Err(AuditError::Unreachable(e.to_string()));
            }
        };
        emit(events, ProgressEvent::log(step::NETWORK, "Target reachable"));

        let mut ctx = ScanContext::new(url, language).with_headers(headers);
        emit(events, ProgressEvent::log(step::RENDERING, "Rendering page"));
        match self.renderer.render(url, self.config().render_timeout()).await {
            Ok(page) => {
                emit(
                    events,
                    ProgressEvent::log(step::RENDERING, format!("Rendered page captured ({} bytes)", page.html.len())),
                );
                ctx = ctx.with_html(page.html).with_cookies(page.cookies);
            }
            Err(e) => {
                debug!("Renderer unavailable for {}: {}", url, e);
                emit(
                    events,
                    ProgressEvent::log(step::RENDERING, "Rendering unavailable, analyzers will fetch the page directly"),
                );
            }
        }

        emit(events, ProgressEvent::log(step::ANALYSIS, "Running 8 analyzers"));
        let ctx = Arc::new(ctx);
        let mut result = AnalysisResult::new(url);
        collect_outcomes(url, self.spawn_all(&ctx), &mut result, events).await;

        emit(events, ProgressEvent::log(step::FINALIZE, "Computing global score"));
        let score = compute_global_score(&mut result);
        result.status = ScanStatus::Completed;
        result.scan_duration_seconds = Some(round2(started.elapsed().as_secs_f64()));
        info!(
            "Scan of {} finished: score {}, {} errors, {:.2}s",
            url,
            score,
            result.errors.len(),
            result.scan_duration_seconds.unwrap_or_default()
        );

        Ok(result)
    }

    /// HEAD（跟随重定向）；HEAD 失败或头部过少时 GET。任何 HTTP 状态都视为可达
    async fn preflight(&self, url: &str) -> AuditResult<ResponseHeaders> {
        let timeout = self.config().probe_timeout();
        let head = match self.probe.head(url, timeout).await {
            Ok(head) => head,
            Err(e) => {
                debug!("Preflight HEAD {} failed ({}), retrying with GET", url, e);
                return Ok(self.probe.get(url, timeout).await?.headers);
            }
        };

        if head.headers.len() < MIN_PREFLIGHT_HEADERS {
            if let Ok(get) = self.probe.get(url, timeout).await {
                return Ok(get.headers);
            }
        }
        Ok(head.headers)
    }

    fn spawn_all(&self, ctx: &Arc<ScanContext>) -> FuturesUnordered<BoxFuture<'static, DimensionOutcome>> {
        let probe = &self.probe;
        let pending = FuturesUnordered::new();
        pending.push(spawn_analyzer(SeoAnalyzer::new(probe.clone()), ctx));
        pending.push(spawn_analyzer(SecurityAnalyzer::new(probe.clone()), ctx));
        pending.push(spawn_analyzer(TechStackAnalyzer::new(probe.clone()), ctx));
        pending.push(spawn_analyzer(BrokenLinksAnalyzer::new(probe.clone()), ctx));
        pending.push(spawn_analyzer(GdprAnalyzer::new(probe.clone()), ctx));
        pending.push(spawn_analyzer(SocialPreviewAnalyzer::new(probe.clone()), ctx));
        pending.push(spawn_analyzer(GreenItAnalyzer::new(probe.clone()), ctx));
        pending.push(spawn_analyzer(DnsHealthAnalyzer::new(probe.clone()), ctx));
        pending
    }
}

/// 每个分析器独立任务，panic 被转换为该维度的错误
fn spawn_analyzer<A: Analyzer>(analyzer: A, ctx: &Arc<ScanContext>) -> BoxFuture<'static, DimensionOutcome> {
    let dimension = <A::Output as DimensionResult>::DIMENSION;
    let ctx = Arc::clone(ctx);
    let handle = tokio::spawn(async move { analyzer.run(&ctx).await.map(Into::<DimensionReport>::into) });

    async move {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(AuditError::AsyncTaskError(e.to_string())),
        };
        (dimension, outcome)
    }
    .boxed()
}

/// 按实际完成顺序回填；失败的维度替换为带错误的默认值
async fn collect_outcomes(
    url: &str,
    mut pending: FuturesUnordered<BoxFuture<'static, DimensionOutcome>>,
    result: &mut AnalysisResult,
    events: Option<&UnboundedSender<ProgressEvent>>,
) {
    while let Some((dimension, outcome)) = pending.next().await {
        match outcome {
            Ok(report) => {
                result.apply(report);
                let message = format!("{} analysis completed", dimension.label());
                emit(events, ProgressEvent::log(dimension.key(), message));
            }
            Err(e) => {
                warn!("{} analysis for {} failed: {}", dimension.label(), url, e);
                let message = format!("{} analysis failed: {}", dimension.label(), e);
                result.record_failure(dimension, e.to_string());
                emit(events, ProgressEvent::log(dimension.key(), message));
            }
        }
    }
}

fn emit(events: Option<&UnboundedSender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = events {
        // 接收端已关闭时丢弃
        let _ = tx.send(event);
    }
}

pub fn decide_winner(target: u8, competitor: u8) -> Winner {
    match target.cmp(&competitor) {
        std::cmp::Ordering::Greater => Winner::Target,
        std::cmp::Ordering::Less => Winner::Competitor,
        std::cmp::Ordering::Equal => Winner::Draw,
    }
}

fn round2(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}
