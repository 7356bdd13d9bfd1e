// Concurrency pattern examples: map-reduce, producer-consumer, fan-out fan-in

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use serde::Serialize;
use workpool::patterns::{
    fan_out_fan_in, map_reduce, producer_consumer, FanOutRecord, ProducerConsumerReport,
};
use workpool::pool::default_workers;
use workpool::TaskError;

use super::PoolSettings;
use crate::output::{print_header, OutputFormat};

#[derive(Debug, Serialize)]
struct MapReduceReport {
    inputs: Vec<u64>,
    sum_of_squares: u64,
    mapped: usize,
    failed: usize,
    elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
struct ProdConsReport {
    capacity: usize,
    #[serde(flatten)]
    report: ProducerConsumerReport,
    elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
struct FanOutReport {
    workers: usize,
    records: Vec<FanOutRecord<(u64, u64)>>,
    elapsed_ms: u64,
}

pub async fn mapreduce(settings: &PoolSettings, output: OutputFormat) -> Result<()> {
    if output.is_text() {
        print_header("Map-Reduce Pattern Example");
    }

    let inputs: Vec<u64> = (1..=10).collect();
    let started = Instant::now();

    let result = map_reduce(
        settings.config("mapreduce", default_workers()),
        inputs.clone(),
        |n: u64| async move {
            n.checked_mul(n)
                .ok_or_else(|| TaskError::failed(format!("{n} squared overflows u64")))
        },
        0u64,
        |acc, sq| acc + sq,
    )
    .await
    .context("map-reduce example failed")?;
    let elapsed = started.elapsed();

    for (index, err) in &result.errors {
        tracing::warn!(input = inputs[*index], error = %err, "map step failed");
    }

    if output.is_text() {
        println!(
            "Sum of squares (1² + 2² + ... + 10²) = {}",
            result.value
        );
        return Ok(());
    }

    output.print_value(&MapReduceReport {
        inputs,
        sum_of_squares: result.value,
        mapped: result.mapped,
        failed: result.errors.len(),
        elapsed_ms: elapsed.as_millis() as u64,
    })
}

pub async fn prodcons(output: OutputFormat) -> Result<()> {
    const CAPACITY: usize = 5;

    if output.is_text() {
        print_header("Producer-Consumer Pattern Example");
    }

    let text = output.is_text();
    let started = Instant::now();

    let items = stream::iter(1..=10u32).then(move |i| async move {
        if text {
            println!("Producing: {}", i);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        i
    });

    let report = producer_consumer(CAPACITY, items, move |i| async move {
        if text {
            println!("Consuming: {}", i);
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    })
    .await;
    let elapsed = started.elapsed();

    tracing::info!(
        produced = report.produced,
        consumed = report.consumed,
        peak_buffered = report.peak_buffered,
        "Producer-consumer finished"
    );

    if text {
        println!("Producer-Consumer example completed");
        return Ok(());
    }

    output.print_value(&ProdConsReport {
        capacity: CAPACITY,
        report,
        elapsed_ms: elapsed.as_millis() as u64,
    })
}

pub async fn fanout(settings: &PoolSettings, output: OutputFormat) -> Result<()> {
    if output.is_text() {
        print_header("Fan-out Fan-in Pattern Example");
    }

    let workers = settings.workers.unwrap_or(3);
    let started = Instant::now();

    let records = fan_out_fan_in(workers, 1..=9u64, |n| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        (n, n * n)
    })
    .await;
    let elapsed = started.elapsed();

    if output.is_text() {
        for record in &records {
            match &record.output {
                Ok((n, sq)) => println!("Worker {}: {}² = {}", record.worker_id, n, sq),
                Err(err) => println!("Worker {} failed: {}", record.worker_id, err),
            }
        }
        println!("Fan-out Fan-in example completed");
        return Ok(());
    }

    output.print_value(&FanOutReport {
        workers: workers.max(1),
        records,
        elapsed_ms: elapsed.as_millis() as u64,
    })
}
