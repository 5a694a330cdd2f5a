//! Inline styling and artwork for exported reports.

/// Stylesheet embedded in every report.
pub const STYLES: &str = r#"
    body {
      margin: 0;
      padding: 0;
      background-color: #E5E5E5;
      font-family: -apple-system, BlinkMacSystemFont, "Inter", "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
      color: #1E293B;
      -webkit-print-color-adjust: exact;
      print-color-adjust: exact;
    }
    .page-container {
      max-width: 800px;
      margin: 40px auto;
      background-color: #F8F5F0;
      padding: 48px 32px;
      box-shadow: 0 4px 20px rgba(0,0,0,0.1);
      box-sizing: border-box;
    }
    .header { text-align: center; margin-bottom: 40px; }
    .logo { display: inline-flex; align-items: center; gap: 8px; color: #996548; font-weight: 700; font-size: 18px; margin-bottom: 24px; }
    .report-title { color: #727C8B; font-size: 14px; text-transform: uppercase; letter-spacing: 1px; margin-bottom: 24px; font-weight: 600; }
    .podcast-title { font-family: "Merriweather", Georgia, serif; font-size: 32px; font-weight: 700; color: #1E293B; margin: 0 0 16px 0; line-height: 1.2; }
    .meta-divider { height: 1px; background-color: #EBECEE; margin: 16px auto; width: 100%; max-width: 200px; }
    .meta-info { font-size: 14px; color: #727C8B; font-weight: 500; letter-spacing: 0.5px; }

    .stats-grid { display: grid; grid-template-columns: 1fr 1fr 1fr; gap: 16px; margin-bottom: 48px; }
    .stat-card { background: #FCFCFC; border: 1px solid #EBECEE; border-radius: 12px; padding: 16px; text-align: center; }
    .stat-number { font-size: 32px; font-weight: 700; color: #996548; display: block; margin-bottom: 4px; font-family: "Merriweather", Georgia, serif; }
    .stat-label { font-size: 11px; color: #727C8B; text-transform: uppercase; letter-spacing: 1px; font-weight: 600; }

    .section-title { font-size: 20px; font-weight: 700; color: #1E293B; margin: 0 0 16px 0; padding-bottom: 12px; border-bottom: 1px solid #EBECEE; }

    .summary-card {
      background: linear-gradient(135deg, #996548 0%, #F9EFE9 100%);
      border-radius: 24px;
      padding: 32px;
      margin-bottom: 48px;
      color: #1E293B;
      position: relative;
      overflow: hidden;
    }
    .summary-section { margin-bottom: 24px; }
    .summary-section:last-child { margin-bottom: 0; }
    .summary-heading { font-size: 16px; font-weight: 700; margin-bottom: 8px; display: flex; align-items: center; gap: 8px; color: #FCFCFC; text-shadow: 0 1px 2px rgba(0,0,0,0.1); }
    .summary-section:not(:first-child) .summary-heading { color: #996548; text-shadow: none; }
    .summary-content { font-size: 15px; line-height: 1.6; color: #FCFCFC; }
    .summary-section:not(:first-child) .summary-content { color: #1E293B; }
    .summary-content ul { margin: 0; padding-left: 20px; }
    .summary-content li { margin-bottom: 4px; }
    .summary-placeholder { text-align: center; padding: 20px; color: #727C8B; }

    .notes-group { margin-bottom: 40px; page-break-inside: avoid; }
    .group-title { color: #996548; font-size: 18px; font-weight: 600; margin-bottom: 16px; display: flex; align-items: center; gap: 8px; font-family: "Merriweather", Georgia, serif; }

    .note-card { background: #FCFCFC; border: 1px solid #EBECEE; border-radius: 12px; padding: 20px; margin-bottom: 16px; position: relative; overflow: hidden; page-break-inside: avoid; }
    .note-card.highlight { border-left: 4px solid #FCD34D; }
    .note-card.extract { border-left: 4px solid #A855F7; }
    .note-card.deep-dive { border-left: 4px solid #3B82F6; }

    .quote-box { background: #F9EFE9; padding: 12px 16px; border-radius: 8px; font-family: "Merriweather", Georgia, serif; font-style: italic; color: #555; font-size: 14px; margin-bottom: 12px; line-height: 1.6; white-space: pre-wrap; }
    .note-content { font-size: 15px; line-height: 1.6; color: #1E293B; }
    .note-content p { margin: 0 0 8px 0; }
    .reflection { white-space: pre-wrap; }
    .insight-label { font-size: 11px; text-transform: uppercase; letter-spacing: 0.5px; font-weight: 700; color: #727C8B; margin-bottom: 4px; display: block; }
    .empty-notes { text-align: center; color: #727C8B; margin: 40px 0; }

    strong, b { font-weight: 700; color: #1E293B; }

    .footer { text-align: center; margin-top: 64px; padding-top: 32px; border-top: 1px solid #EBECEE; }
    .footer-brand { font-size: 12px; color: #727C8B; font-weight: 500; }
    .footer-slogan { font-family: "Merriweather", Georgia, serif; color: #996548; font-style: italic; font-size: 14px; margin-top: 8px; }
    .footer-icon { color: #996548; margin-top: 16px; opacity: 0.8; }

    @media print {
      body { background: white; }
      .page-container { box-shadow: none; margin: 0; width: 100%; max-width: 100%; padding: 0; border: none; }
      .summary-card { background: #F9EFE9 !important; border: 1px solid #EBECEE; color: #1E293B !important; }
      .summary-heading, .summary-content { color: #1E293B !important; text-shadow: none !important; }
    }
"#;

/// PodEcho logo: concentric echo arcs around a dot.
pub fn logo_svg(size: u32) -> String {
    format!(
        r#"<svg width="{size}" height="{size}" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><circle cx="12" cy="12" r="2"></circle><path d="M4.93 19.07a10 10 0 0 1 0-14.14"></path><path d="M7.76 16.24a6 6 0 0 1 0-8.48"></path><path d="M16.24 7.76a6 6 0 0 1 0 8.48"></path><path d="M19.07 4.93a10 10 0 0 1 0 14.14"></path></svg>"#
    )
}
