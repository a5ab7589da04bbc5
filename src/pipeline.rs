// src/pipeline.rs - streaming block executor for parsed pipe chains

use crate::error::{ProcessingError, SyntaxError};
use crate::pipe::{parse_query, Pipe};
use crate::row::{Row, MSG_FIELD};
use rayon::prelude::*;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// One JSON object per line; blank lines are ignored
    #[value(name = "jsonl")]
    Jsonl,
    /// Plain text lines, wrapped as `{_msg: line}`
    #[value(name = "line")]
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    #[value(name = "jsonl")]
    Jsonl,
    /// The `_msg` value per row
    #[value(name = "line")]
    Line,
}

/// What to do with input lines that fail to parse as records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStrategy {
    /// Skip problematic lines, count them, continue
    Skip,
    /// Stop processing on the first bad line
    FailFast,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub error_strategy: ErrorStrategy,
    pub debug: bool,
    /// Rows per block, the unit of parallel distribution
    pub block_size: usize,
    /// Blocks buffered before one parallel round
    pub batch_blocks: usize,
    pub input_format: InputFormat,
    pub output_format: OutputFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            error_strategy: ErrorStrategy::Skip,
            debug: false,
            block_size: 1024,
            batch_blocks: 16,
            input_format: InputFormat::Jsonl,
            output_format: OutputFormat::Jsonl,
        }
    }
}

/// Runtime statistics, reported on stderr with `--stats`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub lines_read: usize,
    pub rows_processed: usize,
    pub rows_output: usize,
    pub parse_errors: usize,
    pub blocks_processed: usize,
    pub processing_time: Duration,
}

/// A parsed pipe chain plus execution configuration. The pipes are
/// immutable and shared; blocks within one batch are processed on the
/// rayon pool and written back in input order.
pub struct QueryPipeline {
    pipes: Vec<Arc<dyn Pipe>>,
    config: PipelineConfig,
    stats: ProcessingStats,
}

impl QueryPipeline {
    pub fn new(pipes: Vec<Arc<dyn Pipe>>, config: PipelineConfig) -> Self {
        QueryPipeline {
            pipes,
            config,
            stats: ProcessingStats::default(),
        }
    }

    pub fn from_query(query: &str, config: PipelineConfig) -> Result<Self, SyntaxError> {
        Ok(QueryPipeline::new(parse_query(query)?, config))
    }

    pub fn pipes(&self) -> &[Arc<dyn Pipe>] {
        &self.pipes
    }

    /// Accumulated stats across all streams processed so far.
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Run every pipe over one block, in chain order.
    pub fn process_block(&self, rows: &mut Vec<Row>) {
        for pipe in &self.pipes {
            pipe.process_block(rows);
        }
    }

    /// Process one input stream to completion. A downstream hang-up
    /// (broken pipe) ends processing quietly, like any well-behaved
    /// stream filter.
    pub fn process_stream<R: BufRead, W: Write>(
        &mut self,
        input: R,
        output: &mut W,
    ) -> Result<ProcessingStats, ProcessingError> {
        let start_time = Instant::now();
        let mut file_stats = ProcessingStats::default();
        let mut batch: Vec<Vec<Row>> = Vec::new();
        let mut block: Vec<Row> = Vec::with_capacity(self.config.block_size);
        let mut line_number = 0usize;

        for line_result in input.lines() {
            let line = match line_result {
                Ok(line) => line,
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        break;
                    }
                    return Err(ProcessingError::IoError(e));
                }
            };
            line_number += 1;
            file_stats.lines_read += 1;

            let row = match self.parse_row(&line, line_number) {
                Ok(Some(row)) => row,
                Ok(None) => continue,
                Err(err) => match self.config.error_strategy {
                    ErrorStrategy::FailFast => return Err(err),
                    ErrorStrategy::Skip => {
                        file_stats.parse_errors += 1;
                        if self.config.debug {
                            eprintln!("loq: {}", err);
                        }
                        continue;
                    }
                },
            };
            file_stats.rows_processed += 1;
            block.push(row);

            if block.len() >= self.config.block_size {
                batch.push(std::mem::replace(
                    &mut block,
                    Vec::with_capacity(self.config.block_size),
                ));
                if batch.len() >= self.config.batch_blocks {
                    if let Err(e) = self.flush_batch(&mut batch, output, &mut file_stats) {
                        if e.is_broken_pipe() {
                            batch.clear();
                            block.clear();
                            break;
                        }
                        return Err(e);
                    }
                }
            }
        }

        if !block.is_empty() {
            batch.push(block);
        }
        if let Err(e) = self.flush_batch(&mut batch, output, &mut file_stats) {
            if !e.is_broken_pipe() {
                return Err(e);
            }
        }

        file_stats.processing_time = start_time.elapsed();

        self.stats.lines_read += file_stats.lines_read;
        self.stats.rows_processed += file_stats.rows_processed;
        self.stats.rows_output += file_stats.rows_output;
        self.stats.parse_errors += file_stats.parse_errors;
        self.stats.blocks_processed += file_stats.blocks_processed;
        self.stats.processing_time += file_stats.processing_time;

        Ok(file_stats)
    }

    fn parse_row(&self, line: &str, line_number: usize) -> Result<Option<Row>, ProcessingError> {
        match self.config.input_format {
            InputFormat::Line => Ok(Some(Row::from_line(line))),
            InputFormat::Jsonl => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                let value: serde_json::Value =
                    serde_json::from_str(trimmed).map_err(|e| ProcessingError::BadInputLine {
                        line: line_number,
                        message: e.to_string(),
                    })?;
                let row = Row::from_json(&value).map_err(|message| {
                    ProcessingError::BadInputLine {
                        line: line_number,
                        message,
                    }
                })?;
                Ok(Some(row))
            }
        }
    }

    /// Process every buffered block and write the results in input order.
    fn flush_batch<W: Write>(
        &self,
        batch: &mut Vec<Vec<Row>>,
        output: &mut W,
        stats: &mut ProcessingStats,
    ) -> Result<(), ProcessingError> {
        if batch.is_empty() {
            return Ok(());
        }
        if batch.len() == 1 {
            self.process_block(&mut batch[0]);
        } else {
            batch
                .par_iter_mut()
                .for_each(|block| self.process_block(block));
        }
        for block in batch.drain(..) {
            stats.blocks_processed += 1;
            for row in &block {
                self.write_row(output, row)?;
                stats.rows_output += 1;
            }
        }
        Ok(())
    }

    fn write_row<W: Write>(&self, output: &mut W, row: &Row) -> Result<(), ProcessingError> {
        match self.config.output_format {
            OutputFormat::Jsonl => writeln!(output, "{}", row.to_json())?,
            OutputFormat::Line => writeln!(output, "{}", row.get(MSG_FIELD))?,
        }
        Ok(())
    }
}
