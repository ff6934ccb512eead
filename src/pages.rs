//! Server-rendered HTML pages.

use handlebars::{Handlebars, RenderError, TemplateError};
use serde_json::json;

use crate::gallery::GalleryCard;
use crate::social::SocialRendition;

const LAYOUT_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{{page_title}} · Media Share</title>
    <style>
        body { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; background: #1d232a; color: #e5e7eb; margin: 0; }
        nav { display: flex; gap: 16px; padding: 16px 32px; background: #191e24; }
        nav a { color: #e5e7eb; text-decoration: none; }
        main { max-width: 1200px; margin: 0 auto; padding: 32px; }
        .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(320px, 1fr)); gap: 24px; }
        .card { background: #2a323c; border-radius: 12px; overflow: hidden; }
        .card figure { margin: 0; position: relative; aspect-ratio: 16 / 9; background: #111; }
        .card figure img, .card figure video { width: 100%; height: 100%; object-fit: cover; }
        .card .duration { position: absolute; bottom: 8px; right: 8px; background: rgba(0,0,0,.7); padding: 2px 8px; border-radius: 6px; font-size: 14px; }
        .card .body { padding: 16px; }
        .card .sizes { display: grid; grid-template-columns: 1fr 1fr; gap: 8px; font-size: 14px; }
        .muted { opacity: .7; font-size: 14px; }
        .no-preview { display: flex; height: 100%; align-items: center; justify-content: center; color: #f87171; }
        .button { display: inline-block; background: #7480ff; color: #fff; padding: 6px 14px; border-radius: 6px; text-decoration: none; border: 0; cursor: pointer; }
    </style>
</head>
<body>
<nav>
    <a href="/home">Home</a>
    <a href="/social-share">Social Share</a>
    <a href="/video-upload">Video Upload</a>
</nav>
<main>
"#;

const LAYOUT_FOOT: &str = "</main>\n</body>\n</html>\n";

const GALLERY: &str = r#"{{> head}}
<h1>Videos</h1>
{{#if cards}}
<div class="grid">
    {{#each cards}}
    <div class="card">
        <figure data-thumbnail="{{thumbnailUrl}}" data-preview="{{previewUrl}}">
            <img src="{{thumbnailUrl}}" alt="{{title}}">
            <div class="duration">{{duration}}</div>
        </figure>
        <div class="body">
            <h2>{{title}}</h2>
            <p class="muted">{{description}}</p>
            <p class="muted">Uploaded {{uploaded}}</p>
            <div class="sizes">
                <div><strong>Original</strong><br>{{originalSize}}</div>
                <div><strong>Compressed</strong><br>{{compressedSize}}</div>
            </div>
            <p>
                Compression: <span>{{compressionLabel}}</span>
                <a class="button" href="{{fullUrl}}" download="{{downloadFileName}}" data-save-as="{{downloadFileName}}">Download</a>
            </p>
        </div>
    </div>
    {{/each}}
</div>
<script>
document.querySelectorAll('figure[data-preview]').forEach(function (figure) {
    var img = figure.querySelector('img');
    figure.addEventListener('mouseenter', function () {
        var video = document.createElement('video');
        video.src = figure.dataset.preview;
        video.autoplay = true;
        video.muted = true;
        video.loop = true;
        video.onerror = function () {
            var fallback = document.createElement('div');
            fallback.className = 'no-preview';
            fallback.textContent = 'Preview not available';
            video.replaceWith(fallback);
        };
        img.replaceWith(video);
    });
    figure.addEventListener('mouseleave', function () {
        var current = figure.querySelector('video, .no-preview');
        if (current) { current.replaceWith(img); }
    });
});
</script>
{{> save_as}}
{{else}}
<p class="muted">No videos available</p>
{{/if}}
{{> foot}}
"#;

const UPLOAD: &str = r#"{{> head}}
<h1>Upload Video</h1>
<form id="upload" action="/api/vid-upload" method="post" enctype="multipart/form-data">
    <p><label>Title<br><input type="text" name="title" required></label></p>
    <p><label>Description<br><textarea name="desc"></textarea></label></p>
    <p><label>Video File<br><input type="file" name="file" accept="video/*" required></label></p>
    <input type="hidden" name="origSize" value="">
    <button class="button" type="submit">Upload File</button>
    <p id="upload-error" class="muted"></p>
</form>
<script>
var form = document.getElementById('upload');
var uploadError = document.getElementById('upload-error');
form.addEventListener('submit', function (event) {
    event.preventDefault();
    var file = form.elements.file.files[0];
    if (!file) { return; }
    if (file.size > {{maxUploadBytes}}) {
        uploadError.textContent = 'File too large, the limit is {{maxUploadLabel}}.';
        return;
    }
    form.elements.origSize.value = String(file.size);
    uploadError.textContent = 'Uploading...';
    fetch(form.action, { method: 'POST', body: new FormData(form), credentials: 'same-origin' })
        .then(function (response) {
            if (response.ok) {
                window.location.href = '/home';
                return;
            }
            return response.json().then(function (body) {
                uploadError.textContent = body.error || 'Failed to upload video';
            });
        })
        .catch(function () { uploadError.textContent = 'Failed to upload video'; });
});
</script>
{{> foot}}
"#;

const SOCIAL_SHARE: &str = r#"{{> head}}
<h1>Social Media Image Creator</h1>
<form id="social-upload" action="/api/img-upload" method="post" enctype="multipart/form-data">
    <p><label>Choose an Image File<br><input type="file" name="file" accept="image/*" required></label></p>
    <button class="button" type="submit">Upload</button>
    <p id="social-error" class="muted"></p>
</form>
<div class="grid">
    {{#each renditions}}
    <div class="card">
        <div class="body">
            <h2>{{label}}</h2>
            <p class="muted">{{width}} × {{height}}</p>
            {{#if url}}
            <img src="{{url}}" alt="{{label}}" style="max-width: 100%">
            <p><a class="button" href="{{url}}" download="{{downloadFileName}}" data-save-as="{{downloadFileName}}">Download for {{label}}</a></p>
            {{/if}}
        </div>
    </div>
    {{/each}}
</div>
<script>
var socialForm = document.getElementById('social-upload');
var socialError = document.getElementById('social-error');
socialForm.addEventListener('submit', function (event) {
    event.preventDefault();
    socialError.textContent = 'Uploading...';
    fetch(socialForm.action, { method: 'POST', body: new FormData(socialForm), credentials: 'same-origin' })
        .then(function (response) {
            return response.json().then(function (body) {
                if (response.ok && body.publicID) {
                    window.location.href = '/social-share?image=' + encodeURIComponent(body.publicID);
                } else {
                    socialError.textContent = body.error || 'Failed to upload image';
                }
            });
        })
        .catch(function () { socialError.textContent = 'Failed to upload image'; });
});
</script>
{{> save_as}}
{{> foot}}
"#;

// Cross-origin `download` attributes are ignored, so links marked with
// `data-save-as` are fetched into a blob and saved under that name.
const SAVE_AS: &str = r#"<script>
document.querySelectorAll('a[data-save-as]').forEach(function (link) {
    link.addEventListener('click', function (event) {
        event.preventDefault();
        fetch(link.href)
            .then(function (response) {
                if (!response.ok) { throw new Error(response.statusText); }
                return response.blob();
            })
            .then(function (blob) {
                var url = URL.createObjectURL(blob);
                var anchor = document.createElement('a');
                anchor.href = url;
                anchor.download = link.dataset.saveAs;
                document.body.appendChild(anchor);
                anchor.click();
                anchor.remove();
                URL.revokeObjectURL(url);
            })
            .catch(function () { window.open(link.href, '_blank'); });
    });
});
</script>
"#;

/// Registered page templates. Built once at startup.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_partial("head", LAYOUT_HEAD)?;
        registry.register_partial("foot", LAYOUT_FOOT)?;
        registry.register_partial("save_as", SAVE_AS)?;
        registry.register_template_string("gallery", GALLERY)?;
        registry.register_template_string("upload", UPLOAD)?;
        registry.register_template_string("social_share", SOCIAL_SHARE)?;
        Ok(Self { registry })
    }

    pub fn gallery(&self, cards: &[GalleryCard]) -> Result<String, RenderError> {
        self.registry.render(
            "gallery",
            &json!({"page_title": "Home", "cards": cards}),
        )
    }

    pub fn upload(&self, max_upload_bytes: u64) -> Result<String, RenderError> {
        self.registry.render(
            "upload",
            &json!({
                "page_title": "Video Upload",
                "maxUploadBytes": max_upload_bytes,
                "maxUploadLabel": crate::gallery::format_size(max_upload_bytes),
            }),
        )
    }

    pub fn social_share(&self, renditions: &[SocialRendition]) -> Result<String, RenderError> {
        self.registry.render(
            "social_share",
            &json!({"page_title": "Social Share", "renditions": renditions}),
        )
    }
}
