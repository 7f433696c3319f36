//! Experimentation module for the PDP.
//!
//! Runs a constructive heuristic followed by a local search on a batch of
//! instance files, collects objective values and timings, and exports them.

use crate::heuristics::{ConstructiveKind, LocalSearch, LocalSearchKind};
use crate::instance::{parse_instance_name, Distance, PDPInstance};
use crate::validation::validate_p;

use indicatif::{ProgressBar, ProgressStyle};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Result of one constructive + local search run on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Instance name
    pub instance: String,
    /// Constructive heuristic short name
    pub constructive: String,
    /// Local search short name
    pub local_search: String,
    /// Objective after the constructive heuristic (greedy only)
    pub constructive_objective: Option<Distance>,
    /// Constructive time in seconds (greedy only)
    pub constructive_time: Option<f64>,
    /// Objective after the local search
    pub local_search_objective: Distance,
    /// Local search time in seconds
    pub local_search_time: f64,
    /// Number of accepted interchanges
    pub interchanges: usize,
    /// Local search objective minus constructive objective
    pub absolute_improvement: Option<i64>,
    /// Absolute improvement as a percentage of the constructive objective
    pub relative_improvement: Option<f64>,
}

/// Aggregated statistics over a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub num_instances: usize,
    /// Instances where the local search beat the constructive heuristic
    pub improved_instances: usize,
    pub avg_relative_improvement: Option<f64>,
    pub std_relative_improvement: Option<f64>,
    pub avg_constructive_time: Option<f64>,
    pub avg_local_search_time: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Heuristic building the starting solution
    pub constructive: ConstructiveKind,
    /// Heuristic improving it
    pub local_search: LocalSearchKind,
    /// Seed of the random constructive
    pub seed: u64,
    /// Run instances in parallel
    pub parallel: bool,
    /// Display a progress bar
    pub show_progress: bool,
    /// Output directory
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            constructive: ConstructiveKind::Greedy,
            local_search: LocalSearchKind::FirstInterchange,
            seed: 42,
            parallel: true,
            show_progress: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<ExperimentResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run the configured heuristics on one instance
    pub fn run_instance(&self, instance: &PDPInstance) -> ExperimentResult {
        let constructive = self.config.constructive.build(self.config.seed);
        let search = self.config.local_search.build();

        let mut solution = constructive.construct(instance);
        let start = solution.objective;
        let (constructive_objective, constructive_time) = match self.config.constructive {
            ConstructiveKind::Greedy => (Some(start), Some(solution.computation_time)),
            ConstructiveKind::Random => (None, None),
        };

        search.improve(instance, &mut solution);

        let gain = improvement(self.config.constructive, start, solution.objective);
        let absolute_improvement = gain.map(|(abs, _)| abs);
        let relative_improvement = gain.and_then(|(_, rel)| rel);

        log::info!(
            "{}: {} {:?} -> {} {}",
            instance.name,
            constructive.name(),
            constructive_objective,
            search.name(),
            solution.objective
        );

        ExperimentResult {
            instance: instance.name.clone(),
            constructive: self.config.constructive.short_name().to_string(),
            local_search: self.config.local_search.short_name().to_string(),
            constructive_objective,
            constructive_time,
            local_search_objective: solution.objective,
            local_search_time: solution.computation_time,
            interchanges: solution.iterations.unwrap_or(0),
            absolute_improvement,
            relative_improvement,
        }
    }

    /// Load and run every instance file. Results keep the order of `paths`;
    /// files that cannot be loaded or whose p is out of `2..=n` are skipped.
    pub fn run_files(&mut self, paths: &[PathBuf]) {
        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(paths.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
                pb.set_style(style);
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let run = |path: &PathBuf| -> Option<ExperimentResult> {
            let loaded = PDPInstance::from_file(path)
                .and_then(|instance| validate_p(instance.n(), instance.p).map(|_| instance));
            let result = match loaded {
                Ok(instance) => Some(self.run_instance(&instance)),
                Err(e) => {
                    log::warn!("Skipping {:?}: {}", path, e);
                    None
                }
            };
            progress.inc(1);
            result
        };

        let results: Vec<Option<ExperimentResult>> = if self.config.parallel {
            paths.par_iter().map(run).collect()
        } else {
            paths.iter().map(run).collect()
        };

        progress.finish_and_clear();
        self.results.extend(results.into_iter().flatten());
    }

    /// Run the benchmark on instances already in memory
    pub fn run_on_instances(&mut self, instances: &[PDPInstance]) {
        let results: Vec<ExperimentResult> = if self.config.parallel {
            instances.par_iter().map(|i| self.run_instance(i)).collect()
        } else {
            instances.iter().map(|i| self.run_instance(i)).collect()
        };
        self.results.extend(results);
    }

    /// Compute statistics over all recorded results
    pub fn summary(&self) -> BenchmarkSummary {
        let relative: Vec<f64> = self.results.iter().filter_map(|r| r.relative_improvement).collect();
        let ch_times: Vec<f64> = self.results.iter().filter_map(|r| r.constructive_time).collect();
        let ls_times: Vec<f64> = self.results.iter().map(|r| r.local_search_time).collect();

        let improved_instances = self
            .results
            .iter()
            .filter(|r| r.absolute_improvement.map_or(false, |a| a > 0))
            .count();

        BenchmarkSummary {
            num_instances: self.results.len(),
            improved_instances,
            avg_relative_improvement: mean(&relative),
            std_relative_improvement: if relative.len() > 1 {
                Some(relative.iter().std_dev())
            } else {
                None
            },
            avg_constructive_time: mean(&ch_times),
            avg_local_search_time: mean(&ls_times),
        }
    }

    /// Result with the largest relative improvement
    pub fn best_improvement(&self) -> Option<&ExperimentResult> {
        self.results
            .iter()
            .filter(|r| r.relative_improvement.is_some())
            .max_by_key(|r| OrderedFloat(r.relative_improvement.unwrap_or(f64::NEG_INFINITY)))
    }

    /// `<n>_<constructive>_vs_<local search>.csv`
    pub fn results_filename(&self, n: usize) -> String {
        format!(
            "{}_{}_vs_{}.csv",
            n,
            self.config.constructive.short_name(),
            self.config.local_search.short_name()
        )
    }

    /// `output_dir/<results_filename(n)>`
    pub fn results_path(&self, n: usize) -> PathBuf {
        Path::new(&self.config.output_dir).join(self.results_filename(n))
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("          PDP Experiment Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Date: {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        report.push_str(&format!(
            "Heuristics: {} + {}\n\n",
            self.config.constructive.short_name(),
            self.config.local_search.short_name()
        ));

        report.push_str(&format!(
            "{:<20} {:>8} {:>10} {:>8} {:>10} {:>8} {:>10}\n",
            "Instance", "CH OF", "CH Time", "LSH OF", "LSH Time", "Abs", "Rel"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
        for r in &self.results {
            report.push_str(&format!(
                "{:<20} {:>8} {:>10} {:>8} {:>10.4} {:>8} {:>10}\n",
                r.instance,
                opt(r.constructive_objective.map(|v| v.to_string())),
                opt(r.constructive_time.map(|t| format!("{:.4}", t))),
                r.local_search_objective,
                r.local_search_time,
                opt(r.absolute_improvement.map(|v| v.to_string())),
                opt(r.relative_improvement.map(|v| format!("{:.3}%", v))),
            ));
        }
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        let summary = self.summary();
        if self.config.constructive == ConstructiveKind::Greedy {
            report.push_str(&format!(
                "Improved instances: {}/{}\n",
                summary.improved_instances, summary.num_instances
            ));
            if let Some(avg) = summary.avg_relative_improvement {
                report.push_str(&format!("Avg relative improvement: {:.3}%\n", avg));
            }
            if let Some(std) = summary.std_relative_improvement {
                report.push_str(&format!("Std relative improvement: {:.3}%\n", std));
            }
            if let Some(best) = self.best_improvement() {
                report.push_str(&format!(
                    "Largest improvement: {} ({})\n",
                    best.instance,
                    opt(best.relative_improvement.map(|v| format!("{:.3}%", v)))
                ));
            }
        }
        if let Some(t) = summary.avg_local_search_time {
            report.push_str(&format!("Avg local search time: {:.4}s\n", t));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[ExperimentResult] {
        &self.results
    }
}

/// Absolute and relative (%) gain of a local search over its starting objective.
///
/// Only a greedy start is a baseline, so a random start gives `None`. The
/// relative gain is `None` when the start objective is 0.
pub fn improvement(constructive: ConstructiveKind, start: Distance, end: Distance) -> Option<(i64, Option<f64>)> {
    match constructive {
        ConstructiveKind::Random => None,
        ConstructiveKind::Greedy => {
            let abs = end as i64 - start as i64;
            let rel = (start > 0).then(|| abs as f64 / start as f64 * 100.0);
            Some((abs, rel))
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Instance files of size `n` in `dir`, sorted by instance index, at most `count`
pub fn list_instance_files<P: AsRef<Path>>(dir: P, n: usize, count: usize) -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(dir.as_ref())
        .map_err(|e| format!("Cannot read directory {:?}: {}", dir.as_ref(), e))?;

    let mut files: Vec<(usize, PathBuf)> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == "dat").unwrap_or(false))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            match parse_instance_name(stem) {
                Ok((size, _, index)) if size == n => Some((index, path)),
                _ => None,
            }
        })
        .collect();

    files.sort_by_key(|(index, _)| *index);
    Ok(files.into_iter().take(count).map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(constructive: ConstructiveKind, local_search: LocalSearchKind) -> BenchmarkConfig {
        BenchmarkConfig {
            constructive,
            local_search,
            show_progress: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.constructive, ConstructiveKind::Greedy);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_run_instance_with_greedy() {
        let instance = PDPInstance::random(40, 6, 100, 100, 4);
        let bench = Benchmark::new(config(ConstructiveKind::Greedy, LocalSearchKind::BestInterchange));
        let result = bench.run_instance(&instance);

        let ch = result.constructive_objective.unwrap();
        assert!(result.local_search_objective >= ch);
        assert_eq!(
            result.absolute_improvement,
            Some(result.local_search_objective as i64 - ch as i64)
        );
        assert!(result.relative_improvement.unwrap() >= 0.0);
        assert_eq!(result.local_search, "IM");
    }

    #[test]
    fn test_run_instance_with_random() {
        let instance = PDPInstance::random(40, 6, 100, 100, 4);
        let bench = Benchmark::new(config(ConstructiveKind::Random, LocalSearchKind::FirstInterchange));
        let result = bench.run_instance(&instance);

        assert!(result.constructive_objective.is_none());
        assert!(result.absolute_improvement.is_none());
        assert_eq!(bench.results_filename(40), "40_random_vs_IF.csv");
        assert_eq!(bench.results_path(40), Path::new("results").join("40_random_vs_IF.csv"));
    }

    #[test]
    fn test_files_and_export() {
        let dir = std::env::temp_dir().join("pdp_solver_benchmark_test");
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..3 {
            PDPInstance::random(25, 5, 50, 50, i as u64).to_file(&dir, i).unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not an instance").unwrap();

        let files = list_instance_files(&dir, 25, 2).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("25_5_0.dat"));
        assert!(files[1].ends_with("25_5_1.dat"));

        let mut bench = Benchmark::new(config(ConstructiveKind::Greedy, LocalSearchKind::FirstInterchange));
        bench.run_files(&files);
        assert_eq!(bench.results().len(), 2);
        assert_eq!(bench.results()[0].instance, "25_5_0");

        let summary = bench.summary();
        assert_eq!(summary.num_instances, 2);
        assert!(summary.improved_instances <= 2);

        let csv_path = dir.join(bench.results_filename(25));
        bench.export_to_csv(&csv_path).unwrap();
        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("instance,constructive,local_search"));
        assert_eq!(content.lines().count(), 3);

        assert!(bench.generate_report().contains("Improved instances"));
    }

    #[test]
    fn test_improvement_only_from_greedy() {
        assert_eq!(improvement(ConstructiveKind::Random, 4, 9), None);
        assert_eq!(improvement(ConstructiveKind::Greedy, 4, 5), Some((1, Some(25.0))));
        assert_eq!(improvement(ConstructiveKind::Greedy, 0, 3), Some((3, None)));
    }

    #[test]
    fn test_files_with_bad_p_are_skipped() {
        let dir = std::env::temp_dir().join("pdp_solver_bad_p_test");
        std::fs::create_dir_all(&dir).unwrap();
        let body = "0 0 0\n1 0 5\n2 5 0\n3 5 5\n";
        for name in ["4_0_0.dat", "4_9_1.dat", "4_2_2.dat"] {
            std::fs::write(dir.join(name), body).unwrap();
        }
        let files: Vec<PathBuf> = ["4_0_0.dat", "4_9_1.dat", "4_2_2.dat"].iter().map(|f| dir.join(f)).collect();

        for constructive in [ConstructiveKind::Random, ConstructiveKind::Greedy] {
            let mut bench = Benchmark::new(config(constructive, LocalSearchKind::FirstInterchange));
            bench.run_files(&files);

            assert_eq!(bench.results().len(), 1);
            assert_eq!(bench.results()[0].instance, "4_2_2");
            assert_eq!(bench.results()[0].local_search_objective, 7);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let instances: Vec<PDPInstance> =
            (0..4).map(|s| PDPInstance::random(30, 4, 60, 60, s)).collect();

        let mut sequential = Benchmark::new(BenchmarkConfig {
            parallel: false,
            ..config(ConstructiveKind::Greedy, LocalSearchKind::BestInterchange)
        });
        let mut parallel = Benchmark::new(config(ConstructiveKind::Greedy, LocalSearchKind::BestInterchange));
        sequential.run_on_instances(&instances);
        parallel.run_on_instances(&instances);

        let objectives = |b: &Benchmark| -> Vec<Distance> {
            b.results().iter().map(|r| r.local_search_objective).collect()
        };
        assert_eq!(objectives(&sequential), objectives(&parallel));
    }
}
