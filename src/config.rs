/// Page geometry in millimetres. Layout runs top-down from the page's upper
/// edge; the writer converts to PDF points.
#[derive(Clone, Debug)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Top edge of the content area, below the header banner.
    pub content_top: f32,
    pub margin_bottom: f32,
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    pub fn content_bottom(&self) -> f32 {
        self.page_height - self.margin_bottom
    }

    pub fn content_height(&self) -> f32 {
        self.content_bottom() - self.content_top
    }
}

impl Default for PageGeometry {
    // A4 portrait
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin_left: 10.0,
            margin_right: 10.0,
            content_top: 30.0,
            margin_bottom: 20.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Branding {
    pub organization: String,
    pub title: String,
    pub author_role: String,
    pub accent_color: [u8; 3],
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            organization: "ORPI Adimmo".into(),
            title: "RAPPORT DE VISITE".into(),
            author_role: "Gestionnaire de copropriété".into(),
            accent_color: [227, 31, 43],
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub geometry: PageGeometry,
    pub branding: Branding,
    /// Room (mm) that must be left on the page after an observation for the
    /// next one to start there.
    pub observation_min_remaining: f32,
    /// Room (mm) required before an observation photo may start on the
    /// current page.
    pub photo_min_remaining: f32,
    pub jpeg_quality: u8,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            branding: Branding::default(),
            observation_min_remaining: 27.0,
            photo_min_remaining: 77.0,
            jpeg_quality: 85,
        }
    }
}
