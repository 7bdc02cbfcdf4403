//! A small built-in report: payload, stylesheet and CSS that exercise the
//! whole pipeline. Used by `pdf-mediator --demo` and by the tests.

/// Registry key of [`SAMPLE_XSL`] in [`sample_registry`].
pub const SAMPLE_XSL_KEY: &str = "conf:/xslt/sample.xsl";

/// Registry key of [`SAMPLE_CSS`] in [`sample_registry`].
pub const SAMPLE_CSS_KEY: &str = "conf:/styles/sample.css";

pub const SAMPLE_PAYLOAD: &str = r#"<report>
  <pdfFilePath pathToFile="pdfPath/file.pdf">pdfPath/file.pdf</pdfFilePath>
  <title>Example page</title>
  <rows>
    <row><a>Row 1</a><b>Column 2</b><c>Column 3</c></row>
    <row><a>Row 2</a><b>Column 2</b><c>Column 3</c></row>
    <row><a>Row 3</a><b>Column 2</b><c>Column 3</c></row>
    <row><a>Row 4</a><b>Column 2</b><c>Column 3</c></row>
  </rows>
</report>"#;

pub const SAMPLE_XSL: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
<xsl:template match="/">
<html>
<head>
<title><xsl:value-of select="/report/title"/></title>
<link href="style.css" rel="stylesheet" type="text/css"/>
</head>
<body>
<h1><xsl:value-of select="/report/title"/></h1>
<table>
<tr><th>Header 1</th><th>Header 2</th><th>Header 3</th></tr>
<xsl:for-each select="/report/rows/row">
<tr><td><xsl:value-of select="a"/></td><td><xsl:value-of select="b"/></td><td><xsl:value-of select="c"/></td></tr>
</xsl:for-each>
</table>
</body>
</html>
</xsl:template>
</xsl:stylesheet>"#;

pub const SAMPLE_CSS: &str = "body { font-family: Helvetica; font-size: 11pt; color: #222 }
h1 { font-size: 20pt; color: #1f3a5f; margin-bottom: 12pt }
table { border: 1px solid #999 }
th { background-color: #e8eef5; font-weight: bold; padding: 4pt }
td { padding: 4pt; border-top: 1px solid #ccc }";

/// Roughly what [`SAMPLE_XSL`] makes of [`SAMPLE_PAYLOAD`], as tag soup.
pub const SAMPLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Example page</title>
<link href="style.css" rel="stylesheet" type="text/css">
</head>
<body>
<h1>Example page</h1>
<table>
<tr><th>Header 1<th>Header 2<th>Header 3
<tr><td>Row 1<td>Column 2<td>Column 3
<tr><td>Row 2<td>Column 2<td>Column 3
</table>
<p>Generated<br>report
</body>
</html>"#;

/// A registry holding the sample stylesheets under their keys.
pub fn sample_registry() -> crate::resources::MemoryRegistry {
    crate::resources::MemoryRegistry::new()
        .with_text(SAMPLE_XSL_KEY, SAMPLE_XSL)
        .with_text(SAMPLE_CSS_KEY, SAMPLE_CSS)
}
