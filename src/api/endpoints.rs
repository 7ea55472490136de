/// URL endpoints of the publishing platform, derived from one base URL.
use url::Url;

#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Cookie-backed home page; redirects to a URL carrying the API token
    pub home: Url,
    /// QR issue (`action=getqrcode`) and status poll (`action=ask`)
    pub scan_login: Url,
    /// Account directory search
    pub search_biz: Url,
    /// Paginated article listing
    pub publish_list: Url,
}

impl Endpoints {
    /// Builds every endpoint below `base`, e.g. `https://mp.weixin.qq.com`.
    pub fn for_base(base: &str) -> Result<Self, url::ParseError> {
        let home = Url::parse(base)?.join("/")?;
        Ok(Self {
            scan_login: home.join("/cgi-bin/scanloginqrcode")?,
            search_biz: home.join("/cgi-bin/searchbiz")?,
            publish_list: home.join("/cgi-bin/appmsgpublish")?,
            home,
        })
    }
}
