// SPDX-License-Identifier: MIT OR Apache-2.0

//! The stream driver: wires reader, transformer chain, and writer
//! together and drains the output channel on the calling thread.
//!
//! Threads: one for the reader, one per transformer, plus the caller.
//! The caller owning the writer keeps all terminal output on one thread,
//! so records and side-channel text interleave in channel order.

use std::io::Write;

use crossbeam_channel::{bounded, never, select};

use crate::core::config::Options;
use crate::core::error::{RecflowError, RecflowResult};
use crate::core::pipeline::{run_chain, STAGE_CHANNEL_CAPACITY};
use crate::core::record::{Context, Envelope};
use crate::core::stream::{input, output};
use crate::core::transform::RecordTransformer;

/// Run a full pipeline over the named input files (stdin when empty),
/// writing rendered records to `out`. Returns after the end-of-stream
/// envelope has passed through every stage and the writer has finished.
pub fn run(
    options: &Options,
    transformers: Vec<Box<dyn RecordTransformer>>,
    filenames: &[String],
    out: Box<dyn Write + Send>,
) -> RecflowResult<()> {
    let reader = input::create(&options.reader)?;
    let mut writer = output::create(&options.writer, out)?;

    let context = Context::new(options.separators());
    let (record_rx, err_rx) = input::spawn_reader(reader, filenames.to_vec(), context);

    let (out_tx, out_rx) = bounded(STAGE_CHANNEL_CAPACITY);
    let handles = run_chain(record_rx, transformers, out_tx);

    let mut err_rx = err_rx;
    let result = loop {
        select! {
            recv(err_rx) -> msg => match msg {
                Ok(err) => break Err(err),
                Err(_) => err_rx = never(),
            },
            recv(out_rx) -> msg => match msg {
                Ok(Envelope::Record(record, _)) => writer.write(&record)?,
                Ok(Envelope::SideOutput(text, _)) => print!("{text}"),
                Ok(Envelope::EndOfStream(_)) | Err(_) => {
                    // The stream terminated, but an error report may have
                    // raced it: select picks arbitrarily among ready
                    // channels, so check before declaring success.
                    match err_rx.try_recv() {
                        Ok(err) => break Err(err),
                        Err(_) => break Ok(()),
                    }
                }
            },
        }
    };

    if result.is_ok() {
        writer.finish()?;
    }
    // Unblock any worker still parked on a send before joining it.
    drop(out_rx);
    for handle in handles {
        handle
            .join()
            .map_err(|_| RecflowError::runtime("pipeline worker thread panicked"))?;
    }
    result
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::sync::{Arc, Mutex};

    use tempfile::NamedTempFile;

    use super::*;
    use crate::core::transform::TransformerRegistry;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedSink {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn drives_a_verb_chain_end_to_end() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a=1,b=2\na=3,b=4\na=5,b=6\n").unwrap();
        file.flush().unwrap();

        let options = Options::default();
        let registry = TransformerRegistry::standard();
        let (head, _) = (registry.lookup("head").unwrap().parse)(
            &["-n".to_string(), "2".to_string()],
            &options,
        )
        .unwrap();
        let (cut, _) = (registry.lookup("cut").unwrap().parse)(
            &["-f".to_string(), "a".to_string()],
            &options,
        )
        .unwrap();

        let sink = SharedSink::default();
        run(
            &options,
            vec![head, cut],
            &[file.path().to_string_lossy().into_owned()],
            Box::new(sink.clone()),
        )
        .unwrap();

        assert_eq!(sink.text(), "a=1\na=3\n");
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let options = Options::default();
        let result = run(
            &options,
            Vec::new(),
            &["/nonexistent/recflow-input".to_string()],
            Box::new(SharedSink::default()),
        );
        assert!(result.is_err());
    }

    // The reader continues past each unreadable file and reports every
    // failure; the run must still terminate with the first error rather
    // than stall on the later reports.
    #[test]
    fn many_missing_input_files_still_error_out() {
        let options = Options::default();
        let filenames: Vec<String> = (0..4)
            .map(|i| format!("/nonexistent/recflow-input-{i}"))
            .collect();
        let result = run(&options, Vec::new(), &filenames, Box::new(SharedSink::default()));
        let err = result.err().unwrap();
        assert!(err.to_string().contains("/nonexistent/recflow-input-0"));
    }
}
