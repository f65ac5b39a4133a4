//! Office Open XML documents: text runs pulled from the zipped XML parts.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;
use zip::result::ZipError;

/// Upper bound on one decompressed XML part.
const MAX_PART_BYTES: u64 = 50 * 1024 * 1024;

const MAX_SHEETS: usize = 100;
const MAX_CELLS_PER_SHEET: usize = 100_000;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

fn open(bytes: &[u8]) -> Result<Archive<'_>, String> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())
}

/// Read one part, or `None` when the archive has no such entry.
fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<Option<Vec<u8>>, String> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    let mut out = Vec::new();
    entry
        .take(MAX_PART_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    if out.len() as u64 >= MAX_PART_BYTES {
        return Err(format!("{name} exceeds {MAX_PART_BYTES} bytes"));
    }
    Ok(Some(out))
}

/// Names of numbered parts such as `ppt/slides/slide3.xml`, in numeric order.
fn numbered_parts(archive: &Archive<'_>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .map(ToString::to_string)
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches(prefix)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

/// Text of every `<t>` element (any namespace), one entry per element.
fn text_runs(xml: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut runs = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text = false,
            Ok(Event::Text(t)) if in_text => {
                runs.push(t.unescape().map_err(|e| e.to_string())?.into_owned());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(runs)
}

pub fn extract_docx(bytes: &[u8]) -> Result<String, String> {
    let mut archive = open(bytes)?;
    let xml = read_part(&mut archive, "word/document.xml")?
        .ok_or_else(|| "word/document.xml not found".to_string())?;
    Ok(text_runs(&xml)?.join(" "))
}

pub fn extract_pptx(bytes: &[u8]) -> Result<String, String> {
    let mut archive = open(bytes)?;
    let mut slides = Vec::new();
    for name in numbered_parts(&archive, "ppt/slides/slide") {
        if let Some(xml) = read_part(&mut archive, &name)? {
            let text = text_runs(&xml)?.join(" ");
            if !text.is_empty() {
                slides.push(text);
            }
        }
    }
    Ok(slides.join("\n"))
}

/// Cell values of one worksheet, shared-string indices resolved.
fn sheet_cells(xml: &[u8], shared: &[String]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut cells = Vec::new();
    let mut shared_cell = false;
    let mut in_value = false;
    while cells.len() < MAX_CELLS_PER_SHEET {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"c" => {
                shared_cell = e.attributes().flatten().any(|a| {
                    a.key.as_ref() == b"t" && a.value.as_ref() == b"s"
                });
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"v" => in_value = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"v" => in_value = false,
            Ok(Event::Text(t)) if in_value => {
                let raw = t.unescape().map_err(|e| e.to_string())?;
                let value = raw.trim();
                if shared_cell {
                    if let Some(s) = value.parse::<usize>().ok().and_then(|i| shared.get(i)) {
                        cells.push(s.clone());
                    }
                } else if !value.is_empty() {
                    cells.push(value.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells)
}

pub fn extract_xlsx(bytes: &[u8]) -> Result<String, String> {
    let mut archive = open(bytes)?;
    let shared = match read_part(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => text_runs(&xml)?,
        None => Vec::new(),
    };
    let mut sheets = Vec::new();
    for name in numbered_parts(&archive, "xl/worksheets/sheet")
        .into_iter()
        .take(MAX_SHEETS)
    {
        if let Some(xml) = read_part(&mut archive, &name)? {
            sheets.push(sheet_cells(&xml, &shared)?.join(" "));
        }
    }
    Ok(sheets.join("\n"))
}
