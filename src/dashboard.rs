//! Dashboard wiring: load once, register for SQL, filter, summarise, replay.
//!
//! Rendering is delegated to a [`Presenter`]. [`TextPresenter`] draws plain
//! horizontal bar charts to any writer.

use crate::aggregate::{MapView, disease_summary, hotspots, regional_summary};
use crate::config::Config;
use crate::error::{EpiError, Result};
use crate::filter::Filter;
use crate::loader::DatasetLoader;
use crate::replay::{CancelToken, Replay, ReplayEngine, Window};
use crate::store::{QueryResult, QueryStore, StoreBuilder};
use crate::table::Table;
use epiwatch_types::summary::{DiseaseSummary, RegionCases, RegionSummary};
use std::io::Write;
use std::path::Path;

/// Everything the static panels show for one filter selection.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub filtered: Table,
    pub regions: Vec<RegionSummary>,
    pub diseases: Vec<DiseaseSummary>,
    pub map: MapView,
}

impl DashboardView {
    pub fn build(filtered: Table) -> Self {
        let regions = regional_summary(&filtered);
        let diseases = disease_summary(&filtered);
        let map = hotspots(&filtered);
        Self {
            filtered,
            regions,
            diseases,
            map,
        }
    }
}

/// Receives each panel as it becomes ready.
pub trait Presenter {
    fn render_view(&mut self, view: &DashboardView) -> Result<()>;

    /// `outcome` carries either the result set or the engine's error.
    fn render_query(&mut self, sql: &str, outcome: &Result<QueryResult>) -> Result<()>;

    fn render_window(&mut self, window: &Window<'_>, cases: &[RegionCases]) -> Result<()>;
}

/// Counts from one full dashboard pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub filtered_rows: usize,
    pub windows_rendered: usize,
    pub cancelled: bool,
}

/// Owns the loaded table and the query store it was registered into.
pub struct Dashboard {
    config: Config,
    data: Table,
    store: QueryStore,
}

impl Dashboard {
    /// Load a CSV file and register it with a store built from `config`.
    pub fn open<P: AsRef<Path>>(path: P, config: Config) -> Result<Self> {
        let data = DatasetLoader::new().load(path)?;
        Self::from_table(data, config)
    }

    pub fn from_table(data: Table, config: Config) -> Result<Self> {
        config.validate().map_err(EpiError::InvalidConfiguration)?;
        let store = StoreBuilder::from_config(&config.store).build()?;
        store.register_table(&data)?;
        Ok(Self {
            config,
            data,
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The unfiltered table as loaded.
    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn view(&self, filter: &Filter) -> DashboardView {
        DashboardView::build(self.data.filter(filter))
    }

    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        self.store.run_query(sql)
    }

    /// Start a paced replay over `table` using the configured chunk size and delay.
    pub fn replay<'a>(&self, table: &'a Table, cancel: CancelToken) -> Result<Replay<'a>> {
        let engine = ReplayEngine::new(self.config.replay.clone())?;
        Ok(engine.replay_until(table, cancel))
    }

    /// Render every panel for `filter`, then stream the filtered rows.
    ///
    /// A failing query is handed to the presenter and does not stop the
    /// pass; presenter errors do.
    pub fn run<P: Presenter>(
        &self,
        filter: &Filter,
        sql: Option<&str>,
        replay: bool,
        presenter: &mut P,
        cancel: CancelToken,
    ) -> Result<RunSummary> {
        let view = self.view(filter);
        presenter.render_view(&view)?;

        let sql = sql.unwrap_or(self.config.default_query.as_str());
        let outcome = self.query(sql);
        if let Err(e) = &outcome {
            log::warn!("Query failed: {}", e);
        }
        presenter.render_query(sql, &outcome)?;

        let mut windows_rendered = 0;
        if replay {
            for window in self.replay(&view.filtered, cancel.clone())? {
                presenter.render_window(&window, &window.summary())?;
                windows_rendered += 1;
            }
        }

        Ok(RunSummary {
            filtered_rows: view.filtered.len(),
            windows_rendered,
            cancelled: cancel.is_cancelled(),
        })
    }
}

const BAR_WIDTH: usize = 40;

/// Plain-text renderer drawing horizontal bar charts.
pub struct TextPresenter<W: Write> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn bars(&mut self, title: &str, bars: &[(&str, i64)]) -> Result<()> {
        writeln!(self.out, "{}", title)?;
        if bars.is_empty() {
            writeln!(self.out, "  (no data)")?;
            return Ok(());
        }

        let label_width = bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
        let max = bars.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1);
        for (label, value) in bars {
            let scaled = i128::from((*value).max(0)) * BAR_WIDTH as i128 / i128::from(max);
            let len = scaled as usize;
            writeln!(
                self.out,
                "  {:<lw$} | {:<bw$} {}",
                label,
                "#".repeat(len),
                value,
                lw = label_width,
                bw = BAR_WIDTH
            )?;
        }
        Ok(())
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn render_view(&mut self, view: &DashboardView) -> Result<()> {
        writeln!(self.out, "Filtered rows: {}", view.filtered.len())?;

        for (name, pick) in [
            ("new_cases", 0usize),
            ("recovered", 1),
            ("deaths", 2),
        ] {
            let bars: Vec<(&str, i64)> = view
                .regions
                .iter()
                .map(|r| {
                    let t = r.totals;
                    (r.region.as_str(), [t.new_cases, t.recovered, t.deaths][pick])
                })
                .collect();
            self.bars(&format!("Regional summary: {}", name), &bars)?;
        }

        let bars: Vec<(&str, i64)> = view
            .diseases
            .iter()
            .map(|d| (d.disease.as_str(), d.new_cases))
            .collect();
        self.bars("Cases by disease", &bars)?;

        match &view.map {
            MapView::Hotspots(spots) => {
                writeln!(self.out, "Hotspots")?;
                for h in spots {
                    writeln!(
                        self.out,
                        "  {} ({:.4}, {:.4}): {}",
                        h.region,
                        h.latitude(),
                        h.longitude(),
                        h.new_cases
                    )?;
                }
            }
            MapView::Unavailable(notice) => writeln!(self.out, "{}", notice)?,
        }
        Ok(())
    }

    fn render_query(&mut self, sql: &str, outcome: &Result<QueryResult>) -> Result<()> {
        writeln!(self.out, "SQL> {}", sql)?;
        match outcome {
            Ok(result) => writeln!(self.out, "{}", result)?,
            Err(e) => writeln!(self.out, "Query error: {}", e)?,
        }
        Ok(())
    }

    fn render_window(&mut self, window: &Window<'_>, cases: &[RegionCases]) -> Result<()> {
        let bars: Vec<(&str, i64)> = cases
            .iter()
            .map(|c| (c.region.as_str(), c.new_cases))
            .collect();
        self.bars(
            &format!(
                "Live new cases: window {} (rows {}..{})",
                window.index() + 1,
                window.offset(),
                window.offset() + window.len()
            ),
            &bars,
        )?;
        self.out.flush()?;
        Ok(())
    }
}
