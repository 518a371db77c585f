//! Record Extraction Pipeline
//!
//! Drives detect, extract, reclaim and emit in lockstep: each completed record
//! is turned into a row and released before the row is handed back. Two ways in:
//! - push: [`RecordExtractor`] takes chunks from the caller (the NIF layer)
//! - pull: [`extract_reader`] / [`extract_file`] read from a source until done

use super::reclaim::RetentionStats;
use super::records::{RecordScanner, ScanStatus};
use crate::error::{ExtractError, Result};
use crate::reader::DEFAULT_CHUNK_SIZE;
use crate::rules::{RuleSet, Row};
use crate::sink::{CsvSink, RowSink};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Push-style extractor: feed chunks, take rows
pub struct RecordExtractor {
    rules: Arc<RuleSet>,
    scanner: RecordScanner,
    rows_emitted: u64,
    /// Failure held back until the rows preceding it have been handed out
    deferred: Option<ExtractError>,
}

impl RecordExtractor {
    pub fn new(rules: Arc<RuleSet>) -> Self {
        let scanner = RecordScanner::new(&rules);
        RecordExtractor {
            rules,
            scanner,
            rows_emitted: 0,
            deferred: None,
        }
    }

    /// Column names in output order
    pub fn columns(&self) -> &[String] {
        self.rules.columns()
    }

    /// Append input; returns the number of unconsumed bytes now buffered
    pub fn feed(&mut self, chunk: &[u8]) -> Result<usize> {
        self.scanner.feed(chunk)?;
        Ok(self.scanner.buffered_bytes())
    }

    /// Pull one chunk from a reader; zero bytes marks end of input
    pub fn fill_from<R: Read>(&mut self, reader: &mut R, chunk_size: usize) -> Result<usize> {
        let read = self.scanner.fill_from(reader, chunk_size)?;
        if read > 0 {
            log::trace!("read {} bytes", read);
        }
        Ok(read)
    }

    /// Declare that no more input will arrive
    pub fn end_of_input(&mut self) {
        self.scanner.finish_input();
    }

    /// Row for the next complete record, `None` when more input is needed or
    /// the document has ended
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        match self.scanner.advance()? {
            ScanStatus::RecordReady => {
                let Some(view) = self.scanner.current_record() else {
                    return Ok(None);
                };
                let row = self.rules.extract(view);
                self.scanner.release_record();
                self.rows_emitted += 1;
                Ok(Some(row))
            }
            ScanStatus::NeedInput | ScanStatus::Finished => Ok(None),
        }
    }

    /// Hand up to `max` rows to a sink
    ///
    /// Rows produced before a failure have already reached the sink when the
    /// error is returned.
    pub fn drain_into<S: RowSink>(&mut self, sink: &mut S, max: usize) -> Result<usize> {
        let mut count = 0;
        while count < max {
            let Some(row) = self.next_row()? else {
                break;
            };
            sink.emit(row)?;
            count += 1;
        }
        Ok(count)
    }

    /// Take up to `max` rows
    ///
    /// A failure after some rows were produced is reported by the next call,
    /// so no completed row is lost.
    pub fn take_rows(&mut self, max: usize) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        match self.drain_into(&mut rows, max) {
            Ok(_) => Ok(rows),
            Err(e) if rows.is_empty() => Err(e),
            Err(e) => {
                self.deferred = Some(e);
                Ok(rows)
            }
        }
    }

    /// End the input and hand every remaining row to a sink
    ///
    /// Fails with `TruncatedInput` if a record (or the document) is still
    /// open; the rows before it have reached the sink by then.
    pub fn finish_into<S: RowSink>(&mut self, sink: &mut S) -> Result<usize> {
        self.end_of_input();
        let count = self.drain_into(sink, usize::MAX)?;
        if !self.scanner.is_finished() {
            // drain stops early only on a finished document or an error
            return Err(ExtractError::Aborted);
        }
        Ok(count)
    }

    pub fn is_finished(&self) -> bool {
        self.scanner.is_finished()
    }

    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }

    pub fn buffered_bytes(&self) -> usize {
        self.scanner.buffered_bytes()
    }

    pub fn bytes_received(&self) -> u64 {
        self.scanner.bytes_received()
    }

    pub fn stats(&self) -> RetentionStats {
        self.scanner.stats()
    }
}

/// Counts for a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub records: u64,
    pub bytes_read: u64,
    pub peak_retained_nodes: usize,
}

/// Extract every record from a reader into a sink
pub fn extract_reader<R: Read, S: RowSink>(
    mut reader: R,
    rules: Arc<RuleSet>,
    sink: &mut S,
) -> Result<ExtractSummary> {
    log::info!(
        "extracting <{}> records into {} columns",
        rules.record_tag(),
        rules.columns().len()
    );

    let mut extractor = RecordExtractor::new(rules);
    sink.begin(extractor.columns())?;

    loop {
        match extractor.next_row()? {
            Some(row) => sink.emit(row)?,
            None if extractor.is_finished() => break,
            None => {
                extractor.fill_from(&mut reader, DEFAULT_CHUNK_SIZE)?;
            }
        }
    }
    sink.finish()?;

    let summary = ExtractSummary {
        records: extractor.rows_emitted(),
        bytes_read: extractor.bytes_received(),
        peak_retained_nodes: extractor.stats().peak_retained_nodes,
    };
    log::info!(
        "extracted {} records from {} bytes (peak retained nodes: {})",
        summary.records,
        summary.bytes_read,
        summary.peak_retained_nodes
    );
    Ok(summary)
}

/// Extract every record of an XML file into a CSV file
pub fn extract_file(input: &Path, output: &Path, rules: Arc<RuleSet>) -> Result<ExtractSummary> {
    log::info!("reading {} -> {}", input.display(), output.display());
    let reader = File::open(input)?;
    let mut sink = CsvSink::create(output)?;
    extract_reader(reader, rules, &mut sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::clinvar::clinvar_rules;
    use crate::rules::{ColumnConfig, RuleSetConfig};
    use std::io::Write;

    fn clinvar() -> Arc<RuleSet> {
        Arc::new(clinvar_rules().unwrap())
    }

    fn simple_rules() -> Arc<RuleSet> {
        Arc::new(
            RuleSet::compile(&RuleSetConfig {
                record_tag: "Rec".into(),
                id_attribute: Some("id".into()),
                columns: vec![
                    ColumnConfig::attribute("id", ".", "id"),
                    ColumnConfig::text("name", "Name"),
                ],
            })
            .unwrap(),
        )
    }

    const VARIANT_5: &str = r#"<VariationArchive VariationID="5" VariationType="single nucleotide variant">
  <Species>Homo sapiens</Species>
  <ClassifiedRecord>
    <SimpleAllele AlleleID="20">
      <GeneList>
        <Gene Symbol="CFTR" GeneID="1080">
          <OMIM>602421</OMIM>
        </Gene>
      </GeneList>
      <VariantType>single nucleotide variant</VariantType>
      <Location>
        <SequenceLocation Assembly="GRCh37" Chr="7" start="900"/>
        <SequenceLocation Assembly="GRCh38" Chr="7" start="1000"/>
      </Location>
      <XRefList>
        <XRef DB="OMIM" ID="602421.0001" Type="Allelic variant"/>
        <XRef DB="dbSNP" ID="rs999" Type="rs"/>
        <XRef DB="OMIM" ID="12345" Type="MIM"/>
      </XRefList>
      <MolecularConsequence Type="missense variant" DB="SO" ID="SO:0001583"/>
    </SimpleAllele>
    <Classifications>
      <GermlineClassification>
        <Description>Pathogenic</Description>
      </GermlineClassification>
    </Classifications>
    <TraitSet Type="Disease">
      <Trait Type="Disease">
        <Name><ElementValue Type="Alternate">CF</ElementValue></Name>
        <Name><ElementValue Type="Preferred">Cystic fibrosis</ElementValue></Name>
      </Trait>
    </TraitSet>
  </ClassifiedRecord>
</VariationArchive>"#;

    fn release(records: &[&str]) -> String {
        let mut doc = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ClinVarVariationRelease ReleaseDate=\"2024-01-01\">\n");
        for record in records {
            doc.push_str(record);
            doc.push('\n');
        }
        doc.push_str("</ClinVarVariationRelease>\n");
        doc
    }

    fn run(doc: &str, rules: Arc<RuleSet>) -> Result<(Vec<Row>, ExtractSummary)> {
        let mut rows = Vec::new();
        let summary = extract_reader(doc.as_bytes(), rules, &mut rows)?;
        Ok((rows, summary))
    }

    #[test]
    fn test_clinvar_record() {
        let (rows, summary) = run(&release(&[VARIANT_5]), clinvar()).unwrap();
        assert_eq!(summary.records, 1);
        let row = &rows[0];
        assert_eq!(row.len(), 12);
        assert_eq!(row.get(0), Some("5"));
        assert_eq!(row.get(1), Some("rs999"));
        assert_eq!(row.get(2), Some("CFTR"));
        assert_eq!(row.get(3), Some("single nucleotide variant"));
        assert_eq!(row.get(4), Some("missense variant"));
        assert_eq!(row.get(5), Some("7"));
        assert_eq!(row.get(6), Some("1000"));
        assert_eq!(row.get(7), Some("Pathogenic"));
        assert_eq!(row.get(8), Some("Cystic fibrosis"));
        assert_eq!(row.get(9), Some("Homo sapiens"));
        assert_eq!(row.get(10), Some("602421"));
        assert_eq!(row.get(11), Some("12345"));
    }

    #[test]
    fn test_minimal_record_yields_nulls() {
        let doc = release(&["<VariationArchive VariationID=\"9\"><Species>Mus musculus</Species></VariationArchive>"]);
        let (rows, _) = run(&doc, clinvar()).unwrap();
        let values = &rows[0].values;
        assert_eq!(values.len(), 12);
        assert_eq!(values[0].as_deref(), Some("9"));
        assert_eq!(values[9].as_deref(), Some("Mus musculus"));
        let absent = values.iter().filter(|v| v.is_none()).count();
        assert_eq!(absent, 10);
    }

    #[test]
    fn test_scope_is_the_current_record() {
        // The dbSNP XRef of record 2 must not leak into record 1 and vice versa
        let doc = release(&[
            "<VariationArchive VariationID=\"1\"><XRef DB=\"OMIM\" ID=\"x\"/></VariationArchive>",
            "<Decoy><XRef DB=\"dbSNP\" ID=\"rs-outside\"/></Decoy>",
            "<VariationArchive VariationID=\"2\"><XRef DB=\"dbSNP\" ID=\"rs2\"/></VariationArchive>",
        ]);
        let (rows, _) = run(&doc, clinvar()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(1), None);
        assert_eq!(rows[1].get(1), Some("rs2"));
    }

    #[test]
    fn test_rows_keep_document_order() {
        let records: Vec<String> = (0..50)
            .map(|i| format!("<Rec id=\"{}\"><Name>n{}</Name></Rec>", i, i))
            .collect();
        let doc = format!("<Set>{}</Set>", records.concat());
        let (rows, _) = run(&doc, simple_rules()).unwrap();
        let ids: Vec<String> = rows.iter().map(|r| r.get(0).unwrap_or("").to_string()).collect();
        let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_peak_memory_independent_of_record_count() {
        let peak = |n: usize| {
            let doc = release(&vec![VARIANT_5; n]);
            let (_, summary) = run(&doc, clinvar()).unwrap();
            assert_eq!(summary.records, n as u64);
            summary.peak_retained_nodes
        };
        let small = peak(10);
        let large = peak(10_000);
        assert!(small > 0);
        assert_eq!(small, large);
    }

    #[test]
    fn test_truncation_after_complete_records() {
        let doc = release(&[VARIANT_5, VARIANT_5]);
        let cut = doc.rfind("<Classifications>").unwrap();

        let mut extractor = RecordExtractor::new(clinvar());
        extractor.feed(doc[..cut].as_bytes()).unwrap();
        let mut rows = Vec::new();
        let err = extractor.finish_into(&mut rows).unwrap_err();

        assert_eq!(rows.len(), 1);
        match err {
            ExtractError::TruncatedInput { record, .. } => assert_eq!(record.as_deref(), Some("5")),
            other => panic!("expected truncation, got {:?}", other),
        }
        assert!(matches!(extractor.take_rows(10), Err(ExtractError::Aborted)));
    }

    #[test]
    fn test_take_rows_defers_failure() {
        let mut extractor = RecordExtractor::new(simple_rules());
        extractor
            .feed(b"<Set><Rec id=\"1\"/><Rec id=\"2\"/><Rec id=\"3\"></Oops></Set>")
            .unwrap();

        let rows = extractor.take_rows(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(matches!(
            extractor.take_rows(10),
            Err(ExtractError::MalformedStructure { .. })
        ));
        assert!(matches!(extractor.take_rows(10), Err(ExtractError::Aborted)));
    }

    #[test]
    fn test_record_released_when_row_is_returned() {
        let mut extractor = RecordExtractor::new(simple_rules());
        extractor
            .feed(b"<Set><Rec id=\"1\"><Name>x</Name><Name>y</Name></Rec><Rec id=\"2\"/>")
            .unwrap();

        let rows = extractor.take_rows(1).unwrap();
        assert_eq!(rows.len(), 1);
        let stats = extractor.stats();
        // Only the open <Set> ancestor is still held
        assert_eq!(stats.retained_nodes, 1);
        assert_eq!(stats.records_reclaimed, 1);
        assert_eq!(stats.nodes_reclaimed, 5);
    }

    #[test]
    fn test_text_matches_parsed_tree() {
        let rules = Arc::new(
            RuleSet::compile(&RuleSetConfig {
                record_tag: "Rec".into(),
                id_attribute: Some("id".into()),
                columns: vec![
                    ColumnConfig::attribute("id", ".", "id"),
                    ColumnConfig::text("name", "Name"),
                    ColumnConfig::text("t", "T"),
                    ColumnConfig::attribute("u", "U", "x"),
                    ColumnConfig::text("c", "C"),
                ],
            })
            .unwrap(),
        );
        let doc = "<Set><Rec id=\"1\"><Name>Patho<!-- c -->genic</Name><T>a\r\nb</T>\
                   <U x=\"a\r\nb\tc\"/><C><![CDATA[x\ry]]><?pi data?>z</C></Rec></Set>";
        let (rows, _) = run(doc, rules).unwrap();
        assert_eq!(
            rows[0].values,
            vec![
                Some("1".to_string()),
                Some("Patho".to_string()),
                Some("a\nb".to_string()),
                Some("a b c".to_string()),
                Some("x\ny".to_string()),
            ]
        );
    }

    #[test]
    fn test_push_in_small_chunks() {
        let doc = release(&[VARIANT_5, VARIANT_5, VARIANT_5]);
        let mut extractor = RecordExtractor::new(clinvar());
        let mut rows = Vec::new();
        for chunk in doc.as_bytes().chunks(7) {
            extractor.feed(chunk).unwrap();
            rows.extend(extractor.take_rows(usize::MAX).unwrap());
        }
        extractor.finish_into(&mut rows).unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.get(6) == Some("1000")));
        assert_eq!(extractor.rows_emitted(), 3);
        assert_eq!(extractor.bytes_received(), doc.len() as u64);
    }

    #[test]
    fn test_take_rows_respects_max() {
        let mut extractor = RecordExtractor::new(simple_rules());
        extractor.feed(b"<Set><Rec id=\"1\"/><Rec id=\"2\"/><Rec id=\"3\"/></Set>").unwrap();
        assert_eq!(extractor.take_rows(2).unwrap().len(), 2);
        assert_eq!(extractor.take_rows(2).unwrap().len(), 1);
        assert!(extractor.take_rows(2).unwrap().is_empty());
    }

    #[test]
    fn test_extract_file_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("release.xml");
        let output = dir.path().join("variants.csv");

        let mut file = File::create(&input).unwrap();
        file.write_all(release(&[VARIANT_5]).as_bytes()).unwrap();
        drop(file);

        let summary = extract_file(&input, &output, clinvar()).unwrap();
        assert_eq!(summary.records, 1);

        let csv = std::fs::read_to_string(&output).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("variation_id,rs_id,gene,variant_type,consequence,chromosome,position,clinical_sig,disease_name,species,mim_gene,mim_disease")
        );
        assert_eq!(
            lines.next(),
            Some("5,rs999,CFTR,single nucleotide variant,missense variant,7,1000,Pathogenic,Cystic fibrosis,Homo sapiens,602421,12345")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_extract_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_file(&dir.path().join("nope.xml"), &dir.path().join("out.csv"), clinvar())
            .unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
