//! Prometheus text exposition format.
//!
//! # References
//!
//! - [Exposition formats](https://prometheus.io/docs/instrumenting/exposition_formats/)
use std::fmt;
use std::io::{self, Write};

use bucket::UpperBound;
use label::{self, Label};
use metric::MetricKind;
use Result;

/// How histogram `_bucket` lines report their counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketMode {
    /// Each bucket reports the number of samples at or below its bound,
    /// so the `+Inf` bucket equals `_count`.
    Cumulative,

    /// Each bucket reports only the samples that fell into it.
    PerBucket,
}
impl Default for BucketMode {
    fn default() -> Self {
        BucketMode::Cumulative
    }
}

/// Byte-counting writer over the caller's sink.
pub(crate) struct ExpositionWriter<'a> {
    writer: &'a mut dyn Write,
    written: usize,
    bucket_mode: BucketMode,
}
impl<'a> ExpositionWriter<'a> {
    pub fn new(writer: &'a mut dyn Write, bucket_mode: BucketMode) -> Self {
        ExpositionWriter {
            writer,
            written: 0,
            bucket_mode,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write_header(&mut self, name: &str, help: &str, kind: MetricKind) -> Result<()> {
        // > HELP lines may contain any sequence of UTF-8 characters (after the metric name),
        // > but the backslash and the line-feed characters have to be escaped as \\ and \n, respectively
        write!(self, "# HELP {} {}\n", name, Escaped(help))?;
        write!(self, "# TYPE {} {}\n", name, kind)?;
        Ok(())
    }

    pub fn end_family(&mut self) -> Result<()> {
        self.write_all(b"\n")?;
        Ok(())
    }
}
impl<'a> Write for ExpositionWriter<'a> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.written += n;
        Ok(n)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Writer of the sample lines of a single series.
///
/// Every line carries the global labels of the registry followed by the labels of the series.
pub struct SampleWriter<'a, 'b: 'a> {
    out: &'a mut ExpositionWriter<'b>,
    name: &'a str,
    global_labels: &'a [Label],
    series_labels: &'a [Label],
}
impl<'a, 'b: 'a> SampleWriter<'a, 'b> {
    pub(crate) fn new(
        out: &'a mut ExpositionWriter<'b>,
        name: &'a str,
        global_labels: &'a [Label],
        series_labels: &'a [Label],
    ) -> Self {
        SampleWriter {
            out,
            name,
            global_labels,
            series_labels,
        }
    }

    /// Returns how histogram buckets are to be reported.
    pub fn bucket_mode(&self) -> BucketMode {
        self.out.bucket_mode
    }

    /// Writes `<name><suffix>{<labels>[,le="<le>"]} <value>`.
    pub fn sample<V: fmt::Display>(
        &mut self,
        suffix: &str,
        le: Option<UpperBound>,
        value: V,
    ) -> Result<()> {
        write!(self.out, "{}{}{{", self.name, suffix)?;
        let mut first = true;
        for label in self.global_labels.iter().chain(self.series_labels.iter()) {
            if !first {
                self.out.write_all(b",")?;
            }
            first = false;
            write!(self.out, "{}", label)?;
        }
        if let Some(le) = le {
            if !first {
                self.out.write_all(b",")?;
            }
            write!(self.out, "le=\"{}\"", le)?;
        }
        write!(self.out, "}} {}\n", value)?;
        Ok(())
    }
}
impl<'a, 'b: 'a> fmt::Debug for SampleWriter<'a, 'b> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SampleWriter")
            .field("name", &self.name)
            .field("global_labels", &self.global_labels)
            .field("series_labels", &self.series_labels)
            .finish()
    }
}

struct Escaped<'a>(&'a str);
impl<'a> fmt::Display for Escaped<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        label::write_escaped(f, self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Vec<Label> {
        pairs
            .iter()
            .map(|&(n, v)| track_try_unwrap!(Label::new(n, v)))
            .collect()
    }

    #[test]
    fn sample_lines_work() {
        let mut buf = Vec::new();
        let global = labels(&[("global", "root")]);
        let series = labels(&[("test", "test1")]);
        let written = {
            let mut out = ExpositionWriter::new(&mut buf, BucketMode::Cumulative);
            track_try_unwrap!(out.write_header("foo", "Foo\\bar", MetricKind::Histogram));
            {
                let mut w = SampleWriter::new(&mut out, "foo", &global, &series);
                track_try_unwrap!(w.sample("_bucket", Some(UpperBound::Finite(2)), 3));
                track_try_unwrap!(w.sample("_sum", None, 5));
            }
            {
                let mut w = SampleWriter::new(&mut out, "foo", &[], &[]);
                track_try_unwrap!(w.sample("_bucket", Some(UpperBound::Infinite), 0));
                track_try_unwrap!(w.sample("", None, -1));
            }
            track_try_unwrap!(out.end_family());
            out.written()
        };
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            r#"# HELP foo Foo\\bar
# TYPE foo histogram
foo_bucket{global="root",test="test1",le="2"} 3
foo_sum{global="root",test="test1"} 5
foo_bucket{le="+Inf"} 0
foo{} -1

"#
        );
        assert_eq!(written, text.len());
    }

    #[test]
    fn full_sink_is_reported() {
        let mut buf = [0u8; 8];
        let mut sink = &mut buf[..];
        let mut out = ExpositionWriter::new(&mut sink, BucketMode::Cumulative);
        assert!(out.write_header("foo", "bar", MetricKind::Counter).is_err());
        assert_eq!(out.written(), 8);
    }
}
