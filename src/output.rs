use anyhow::anyhow;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

pub trait Output: Debug {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Writes each output to a file in a directory, named by filling the location key (which
/// carries its own extension, e.g. `daily.csv`) into a template such as `forecast__{}`.
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        let file_name = formatx!(&self.file_template, location_key)
            .map_err(|err| anyhow!("Invalid output file template: {err:?}"))?;
        Ok(BufWriter::new(File::create(
            self.directory_path.join(file_name),
        )?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(&self, location_key: &str) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(&self, _location_key: &str) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::env;
    use std::fs;

    #[rstest]
    fn should_write_file_named_from_template() {
        let directory = env::temp_dir();
        let output = FileOutput::new(directory.clone(), "hvac_forecast_test__{}".into());

        let mut writer = output.writer_for_location_key("output_test.csv").unwrap();
        writer.write_all(b"a,b\n").unwrap();
        drop(writer);

        let path = directory.join("hvac_forecast_test__output_test.csv");
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n");
        fs::remove_file(path).unwrap();
    }

    #[rstest]
    fn should_treat_sink_as_noop() {
        let output = SinkOutput;
        assert!(output.is_noop());
        assert!(output
            .writer_for_location_key("anything")
            .unwrap()
            .write_all(b"discarded")
            .is_ok());
    }
}
